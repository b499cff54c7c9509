//! Conformance test suite for [`KeyValueStore`] implementations.
//!
//! This module provides async test functions that validate whether a
//! [`KeyValueStore`] implementation satisfies the trait contract. The
//! in-memory store and any remote adapter run the same suite, so the OAuth
//! repositories behave identically on both.
//!
//! Every function expects a store in which no collection exists yet.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each conformance function with
//! a fresh store instance:
//!
//! ```no_run
//! use authkv_storage::conformance;
//! use authkv_storage::MemoryStore;
//!
//! #[tokio::test]
//! async fn item_get_returns_none_for_missing_key() {
//!     conformance::item_get_returns_none_for_missing_key(&MemoryStore::new()).await;
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | Control plane | Create, describe and delete semantics |
//! | Items | Put, get, delete and projection semantics |
//! | Validation | Key attribute checks |
//! | Concurrent | Thread-safety under parallel access |

use std::sync::Arc;

use crate::{
    assert_collection_in_use, assert_collection_not_found,
    backend::KeyValueStore,
    error::StorageError,
    retry::WaitConfig,
    testutil::{collection_spec, make_item},
    types::{AttributeValue, CollectionStatus, PrimaryKey},
    waiter::{wait_until_absent, wait_until_active},
};

async fn ready<S: KeyValueStore + ?Sized>(store: &S, name: &str, key_attribute: &str) {
    store.create_collection(&collection_spec(name, key_attribute)).await.expect("create");
    wait_until_active(store, name, &WaitConfig::default()).await.expect("collection becomes active");
}

// ============================================================================
// Control plane
// ============================================================================

/// `describe_collection` on an unknown name returns `CollectionNotFound`.
pub async fn describe_missing_collection_is_not_found<S: KeyValueStore>(store: &S) {
    let result = store.describe_collection("conf-missing").await;
    assert_collection_not_found!(result);
}

/// A created collection eventually reports `Active` with its key attribute.
pub async fn create_then_describe_reports_active<S: KeyValueStore>(store: &S) {
    ready(store, "conf-create", "id").await;
    let description = store.describe_collection("conf-create").await.expect("describe");
    assert_eq!(description.name, "conf-create");
    assert_eq!(description.key_attribute, "id");
    assert_eq!(description.status, CollectionStatus::Active);
    assert_eq!(description.item_count, 0);
}

/// Creating a collection that already exists fails with `CollectionInUse`.
pub async fn create_existing_collection_is_in_use<S: KeyValueStore>(store: &S) {
    ready(store, "conf-dup", "id").await;
    let result = store.create_collection(&collection_spec("conf-dup", "id")).await;
    assert_collection_in_use!(result, "second create of the same name");
}

/// Deleting an unknown collection fails with `CollectionNotFound`.
pub async fn delete_missing_collection_is_not_found<S: KeyValueStore>(store: &S) {
    let result = store.delete_collection("conf-ghost").await;
    assert_collection_not_found!(result);
}

/// A deleted collection eventually disappears, taking its items with it.
pub async fn delete_collection_removes_items<S: KeyValueStore>(store: &S) {
    ready(store, "conf-drop", "id").await;
    store.put_item("conf-drop", make_item("id", "k1", &[])).await.expect("put");

    store.delete_collection("conf-drop").await.expect("delete collection");
    wait_until_absent(store, "conf-drop", &WaitConfig::default()).await.expect("collection gone");

    ready(store, "conf-drop", "id").await;
    let item = store.get_item("conf-drop", &PrimaryKey::new("id", "k1"), None).await.expect("get");
    assert_eq!(item, None, "recreated collection must start empty");
}

// ============================================================================
// Items
// ============================================================================

/// `get_item` on a nonexistent key returns `Ok(None)`.
pub async fn item_get_returns_none_for_missing_key<S: KeyValueStore>(store: &S) {
    ready(store, "conf-get", "id").await;
    let result = store.get_item("conf-get", &PrimaryKey::new("id", "nope"), None).await;
    assert!(result.is_ok(), "get should not error on missing key: {result:?}");
    assert_eq!(result.expect("checked above"), None, "missing key should return None");
}

/// `put_item` then `get_item` returns every attribute.
pub async fn item_put_then_get_returns_item<S: KeyValueStore>(store: &S) {
    ready(store, "conf-put", "token").await;
    let mut item = make_item("token", "abc", &[("payload", "{}")]);
    item.insert("count".into(), AttributeValue::number(3));
    store.put_item("conf-put", item.clone()).await.expect("put");

    let loaded = store.get_item("conf-put", &PrimaryKey::new("token", "abc"), None).await.expect("get");
    assert_eq!(loaded, Some(item));
}

/// `put_item` with an existing key replaces the whole item.
pub async fn item_put_overwrites_existing<S: KeyValueStore>(store: &S) {
    ready(store, "conf-over", "id").await;
    store.put_item("conf-over", make_item("id", "k", &[("a", "1"), ("b", "2")])).await.expect("put");
    store.put_item("conf-over", make_item("id", "k", &[("a", "3")])).await.expect("overwrite");

    let loaded = store
        .get_item("conf-over", &PrimaryKey::new("id", "k"), None)
        .await
        .expect("get")
        .expect("item exists");
    assert_eq!(loaded.get("a").and_then(AttributeValue::as_s), Some("3"));
    assert!(!loaded.contains_key("b"), "overwrite must not merge attributes");
}

/// `get_item` with a projection returns only the named attributes.
pub async fn item_projection_limits_attributes<S: KeyValueStore>(store: &S) {
    ready(store, "conf-proj", "id").await;
    store
        .put_item("conf-proj", make_item("id", "k", &[("payload", "x"), ("extra", "y")]))
        .await
        .expect("put");

    let loaded = store
        .get_item("conf-proj", &PrimaryKey::new("id", "k"), Some(&["payload"]))
        .await
        .expect("get")
        .expect("item exists");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("payload").and_then(AttributeValue::as_s), Some("x"));
}

/// `delete_item` removes an item and is a no-op for a missing key.
pub async fn item_delete_is_idempotent<S: KeyValueStore>(store: &S) {
    ready(store, "conf-del", "code").await;
    store.put_item("conf-del", make_item("code", "c1", &[])).await.expect("put");

    let key = PrimaryKey::new("code", "c1");
    store.delete_item("conf-del", &key).await.expect("first delete");
    store.delete_item("conf-del", &key).await.expect("second delete should be noop");
    assert_eq!(store.get_item("conf-del", &key, None).await.expect("get"), None);
}

/// Data-plane calls against an unknown collection fail with `CollectionNotFound`.
pub async fn item_ops_on_missing_collection_are_not_found<S: KeyValueStore>(store: &S) {
    let key = PrimaryKey::new("id", "k");
    let put = store.put_item("conf-none", make_item("id", "k", &[])).await;
    assert_collection_not_found!(put, "put_item");
    let get = store.get_item("conf-none", &key, None).await;
    assert_collection_not_found!(get, "get_item");
    let delete = store.delete_item("conf-none", &key).await;
    assert_collection_not_found!(delete, "delete_item");
}

// ============================================================================
// Validation
// ============================================================================

/// Items without a non-empty string key are rejected with `Validation`.
pub async fn item_put_rejects_bad_keys<S: KeyValueStore>(store: &S) {
    ready(store, "conf-val", "id").await;

    let missing = make_item("other", "k", &[]);
    let empty = make_item("id", "", &[]);
    let mut numeric = make_item("other", "k", &[]);
    numeric.insert("id".into(), AttributeValue::number(7));

    for item in [missing, empty, numeric] {
        let result = store.put_item("conf-val", item).await;
        assert!(
            matches!(result, Err(StorageError::Validation { .. })),
            "expected Validation, got: {result:?}"
        );
    }
}

// ============================================================================
// Concurrent access
// ============================================================================

/// Concurrent puts to different keys all succeed.
///
/// Requires `S: 'static` so the store can be shared across spawned tasks
/// via `Arc`.
pub async fn concurrent_puts_to_different_keys<S: KeyValueStore + 'static>(store: Arc<S>) {
    ready(store.as_ref(), "conf-conc", "id").await;

    let mut handles = Vec::new();
    for i in 0u32..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let item = make_item("id", &format!("k{i:04}"), &[("writer", &i.to_string())]);
            store.put_item("conf-conc", item).await.expect("concurrent put");
        }));
    }
    for handle in handles {
        handle.await.expect("task join");
    }

    let description = store.describe_collection("conf-conc").await.expect("describe");
    assert_eq!(description.item_count, 50);
}

// ============================================================================
// Convenience runner
// ============================================================================

/// Run the full conformance suite against the given store.
///
/// ```no_run
/// use std::sync::Arc;
/// use authkv_storage::conformance;
/// use authkv_storage::MemoryStore;
///
/// #[tokio::test]
/// async fn memory_store_conformance() {
///     conformance::run_all(Arc::new(MemoryStore::new())).await;
/// }
/// ```
pub async fn run_all<S: KeyValueStore + 'static>(store: Arc<S>) {
    // Control plane
    describe_missing_collection_is_not_found(store.as_ref()).await;
    create_then_describe_reports_active(store.as_ref()).await;
    create_existing_collection_is_in_use(store.as_ref()).await;
    delete_missing_collection_is_not_found(store.as_ref()).await;
    delete_collection_removes_items(store.as_ref()).await;

    // Items
    item_get_returns_none_for_missing_key(store.as_ref()).await;
    item_put_then_get_returns_item(store.as_ref()).await;
    item_put_overwrites_existing(store.as_ref()).await;
    item_projection_limits_attributes(store.as_ref()).await;
    item_delete_is_idempotent(store.as_ref()).await;
    item_ops_on_missing_collection_are_not_found(store.as_ref()).await;

    // Validation
    item_put_rejects_bad_keys(store.as_ref()).await;

    // Concurrent
    concurrent_puts_to_different_keys(store).await;
}
