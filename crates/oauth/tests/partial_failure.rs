//! Partial-failure behaviour of the two-key token write.
//!
//! Wraps the in-memory store so writes to one collection fail, then checks
//! that the other write is neither skipped nor rolled back.

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use authkv_oauth::{
    EntityKind, KvOAuthStorage, OAuthStorage, OAuthStorageError, StorageConfig, assert_not_found,
    testutil::{sample_access, sample_client},
};
use authkv_storage::{
    CollectionDescription, CollectionSpec, Item, KeyValueStore, MemoryStore, PrimaryKey,
    StorageError, StorageResult,
};

/// Delegates to a [`MemoryStore`], failing puts to one collection while armed.
#[derive(Debug)]
struct FailingStore {
    inner: MemoryStore,
    failing_collection: String,
    armed: AtomicBool,
}

impl FailingStore {
    fn new(failing_collection: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_collection: failing_collection.to_owned(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn create_collection(&self, spec: &CollectionSpec) -> StorageResult<()> {
        self.inner.create_collection(spec).await
    }

    async fn describe_collection(&self, name: &str) -> StorageResult<CollectionDescription> {
        self.inner.describe_collection(name).await
    }

    async fn delete_collection(&self, name: &str) -> StorageResult<()> {
        self.inner.delete_collection(name).await
    }

    async fn put_item(&self, collection: &str, item: Item) -> StorageResult<()> {
        if self.armed.load(Ordering::SeqCst) && collection == self.failing_collection {
            return Err(StorageError::throttled("write capacity exceeded"));
        }
        self.inner.put_item(collection, item).await
    }

    async fn get_item(
        &self,
        collection: &str,
        key: &PrimaryKey,
        projection: Option<&[&str]>,
    ) -> StorageResult<Option<Item>> {
        self.inner.get_item(collection, key, projection).await
    }

    async fn delete_item(&self, collection: &str, key: &PrimaryKey) -> StorageResult<()> {
        self.inner.delete_item(collection, key).await
    }
}

async fn storage_failing(collection: &str) -> (KvOAuthStorage<FailingStore>, Arc<FailingStore>) {
    let store = Arc::new(FailingStore::new(collection));
    let config = StorageConfig::with_prefix("pf_").expect("config");
    let storage = KvOAuthStorage::new(Arc::clone(&store), config);
    storage.schema().provision().await.expect("provision");
    store.arm();
    (storage, store)
}

#[tokio::test]
async fn refresh_write_failure_keeps_access_record() {
    let (storage, _) = storage_failing("pf_refresh").await;

    let err = storage
        .save_access(&sample_access(&sample_client()))
        .await
        .expect_err("mirror write fails");
    assert!(
        matches!(err, OAuthStorageError::Store(StorageError::Throttled { .. })),
        "store error is surfaced unchanged: {err:?}"
    );

    storage.load_access("9999").await.expect("access record stays");
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
}

#[tokio::test]
async fn access_write_failure_skips_refresh_write() {
    let (storage, _) = storage_failing("pf_access").await;

    let err = storage
        .save_access(&sample_access(&sample_client()))
        .await
        .expect_err("access write fails");
    assert!(err.as_store_error().is_some_and(StorageError::is_transient), "{err:?}");

    assert_not_found!(storage.load_access("9999").await, EntityKind::AccessToken);
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
}

#[tokio::test]
async fn retrying_save_after_failure_completes_both_keys() {
    let (storage, store) = storage_failing("pf_refresh").await;
    let token = sample_access(&sample_client());
    storage.save_access(&token).await.expect_err("first attempt fails");

    store.armed.store(false, Ordering::SeqCst);
    storage.save_access(&token).await.expect("second attempt succeeds");

    assert_eq!(storage.load_refresh("r9999").await.expect("mirror"), token);
}
