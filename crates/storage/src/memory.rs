//! In-memory key-value store implementation.
//!
//! This module provides [`MemoryStore`], an in-memory implementation of
//! [`KeyValueStore`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Shared state**: Clones share the same collections
//! - **Lifecycle simulation**: Collections pass through `Creating` and `Deleting` for a
//!   configurable propagation delay, like a remote control plane
//!
//! # Example
//!
//! ```
//! use authkv_storage::{CollectionSpec, KeyValueStore, MemoryStore, PrimaryKey};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     let spec = CollectionSpec::builder().name("clients").key_attribute("id").build();
//!     store.create_collection(&spec).await.unwrap();
//!
//!     let mut item = authkv_storage::Item::new();
//!     item.insert("id".into(), "1234".into());
//!     store.put_item("clients", item).await.unwrap();
//!
//!     let key = PrimaryKey::new("id", "1234");
//!     assert!(store.get_item("clients", &key, None).await.unwrap().is_some());
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Status transitions are evaluated lazily when a collection is accessed

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    backend::KeyValueStore,
    error::{StorageError, StorageResult},
    types::{AttributeValue, CollectionDescription, CollectionSpec, CollectionStatus, Item, PrimaryKey},
};

#[derive(Debug, Clone, Copy)]
enum Phase {
    Creating { ready_at: Instant },
    Active,
    Deleting { gone_at: Instant },
}

#[derive(Debug)]
struct Collection {
    key_attribute: String,
    phase: Phase,
    items: BTreeMap<String, Item>,
}

impl Collection {
    /// Status at `now`, or `None` once a deletion has completed.
    fn status_at(&self, now: Instant) -> Option<CollectionStatus> {
        match self.phase {
            Phase::Creating { ready_at } if ready_at <= now => Some(CollectionStatus::Active),
            Phase::Creating { .. } => Some(CollectionStatus::Creating),
            Phase::Active => Some(CollectionStatus::Active),
            Phase::Deleting { gone_at } if gone_at <= now => None,
            Phase::Deleting { .. } => Some(CollectionStatus::Deleting),
        }
    }
}

/// In-memory key-value store.
///
/// # Cloning
///
/// `MemoryStore` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying collections.
///
/// # Propagation delay
///
/// With the default zero delay, collections become `Active` and disappear
/// immediately. A non-zero delay (see
/// [`with_propagation_delay`](Self::with_propagation_delay)) keeps them in
/// `Creating` / `Deleting` for that long, which lets tests exercise
/// readiness polling.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    propagation_delay: Duration,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections.read().len())
            .field("propagation_delay", &self.propagation_delay)
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store whose control-plane transitions are immediate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose collections take `delay` to become
    /// active after creation and to disappear after deletion.
    #[must_use]
    pub fn with_propagation_delay(delay: Duration) -> Self {
        Self { collections: Arc::default(), propagation_delay: delay }
    }

    /// Returns the configured propagation delay.
    #[must_use]
    pub fn propagation_delay(&self) -> Duration {
        self.propagation_delay
    }

    /// Runs `f` against an active collection, settling any finished
    /// transition first.
    fn with_active<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Collection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let now = Instant::now();
        let mut collections = self.collections.write();
        Self::settle(&mut collections, name, now);
        match collections.get_mut(name) {
            Some(collection) if matches!(collection.phase, Phase::Active) => f(collection),
            _ => Err(StorageError::collection_not_found(name)),
        }
    }

    /// Applies a completed `Creating -> Active` or `Deleting -> gone`
    /// transition for `name`.
    fn settle(collections: &mut HashMap<String, Collection>, name: &str, now: Instant) {
        let status = collections.get(name).map(|c| c.status_at(now));
        match status {
            Some(None) => {
                collections.remove(name);
            },
            Some(Some(CollectionStatus::Active)) => {
                if let Some(collection) = collections.get_mut(name) {
                    collection.phase = Phase::Active;
                }
            },
            _ => {},
        }
    }

    fn key_of(collection: &Collection, item: &Item) -> StorageResult<String> {
        match item.get(&collection.key_attribute) {
            Some(AttributeValue::S(value)) if !value.is_empty() => Ok(value.clone()),
            Some(AttributeValue::S(_)) => Err(StorageError::validation(format!(
                "key attribute '{}' must not be empty",
                collection.key_attribute
            ))),
            Some(_) => Err(StorageError::validation(format!(
                "key attribute '{}' must be a string",
                collection.key_attribute
            ))),
            None => Err(StorageError::validation(format!(
                "item is missing key attribute '{}'",
                collection.key_attribute
            ))),
        }
    }

    fn check_key(collection: &Collection, key: &PrimaryKey) -> StorageResult<()> {
        if key.attribute != collection.key_attribute {
            return Err(StorageError::validation(format!(
                "key attribute '{}' does not match collection key '{}'",
                key.attribute, collection.key_attribute
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    #[tracing::instrument(skip_all, fields(collection = %spec.name))]
    async fn create_collection(&self, spec: &CollectionSpec) -> StorageResult<()> {
        fail_point!("memory-create-collection", |_| {
            Err(StorageError::connection("injected create_collection failure"))
        });

        if spec.key_attribute.is_empty() {
            return Err(StorageError::validation("key attribute name must not be empty"));
        }

        let now = Instant::now();
        let mut collections = self.collections.write();
        Self::settle(&mut collections, &spec.name, now);
        if let Some(existing) = collections.get(&spec.name)
            && let Some(status) = existing.status_at(now)
        {
            return Err(StorageError::collection_in_use(&spec.name, status));
        }

        collections.insert(
            spec.name.clone(),
            Collection {
                key_attribute: spec.key_attribute.clone(),
                phase: Phase::Creating { ready_at: now + self.propagation_delay },
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(collection = %name))]
    async fn describe_collection(&self, name: &str) -> StorageResult<CollectionDescription> {
        let now = Instant::now();
        let mut collections = self.collections.write();
        Self::settle(&mut collections, name, now);
        let collection =
            collections.get(name).ok_or_else(|| StorageError::collection_not_found(name))?;
        let status =
            collection.status_at(now).ok_or_else(|| StorageError::collection_not_found(name))?;

        Ok(CollectionDescription {
            name: name.to_owned(),
            key_attribute: collection.key_attribute.clone(),
            status,
            item_count: collection.items.len(),
        })
    }

    #[tracing::instrument(skip_all, fields(collection = %name))]
    async fn delete_collection(&self, name: &str) -> StorageResult<()> {
        let now = Instant::now();
        let mut collections = self.collections.write();
        Self::settle(&mut collections, name, now);
        let collection =
            collections.get_mut(name).ok_or_else(|| StorageError::collection_not_found(name))?;

        match collection.status_at(now) {
            Some(CollectionStatus::Active) => {
                collection.phase = Phase::Deleting { gone_at: now + self.propagation_delay };
                collection.items.clear();
                Ok(())
            },
            Some(status) => Err(StorageError::collection_in_use(name, status)),
            None => Err(StorageError::collection_not_found(name)),
        }
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn put_item(&self, collection: &str, item: Item) -> StorageResult<()> {
        fail_point!("memory-put-item", |_| {
            Err(StorageError::connection("injected put_item failure"))
        });

        self.with_active(collection, |c| {
            let key = Self::key_of(c, &item)?;
            c.items.insert(key, item);
            Ok(())
        })
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn get_item(
        &self,
        collection: &str,
        key: &PrimaryKey,
        projection: Option<&[&str]>,
    ) -> StorageResult<Option<Item>> {
        self.with_active(collection, |c| {
            Self::check_key(c, key)?;
            let Some(item) = c.items.get(&key.value) else {
                return Ok(None);
            };
            let item: Item = match projection {
                Some(names) => item
                    .iter()
                    .filter(|(name, _)| names.contains(&name.as_str()))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
                None => item.clone(),
            };
            Ok(Some(item))
        })
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn delete_item(&self, collection: &str, key: &PrimaryKey) -> StorageResult<()> {
        self.with_active(collection, |c| {
            Self::check_key(c, key)?;
            c.items.remove(&key.value);
            Ok(())
        })
    }
}
