//! Key-value store trait definition.
//!
//! This module defines the [`KeyValueStore`] trait, the core abstraction over
//! a schemaless, collection-oriented key-value store. All store
//! implementations ([`MemoryStore`](crate::MemoryStore) and the DynamoDB adapter)
//! implement this trait.
//!
//! # Design Philosophy
//!
//! The trait is split in two planes:
//!
//! - **Data plane**: single-item reads and writes addressed by exact primary key. There are no
//!   scans, no secondary indexes and no multi-item transactions.
//! - **Control plane**: collection creation, description and deletion. Both transitions are
//!   asynchronous on real stores; callers that need a collection to be usable wait for it with
//!   [`wait_until_active`](crate::waiter::wait_until_active).
//!
//! Domain-specific logic (entity encoding, expiration) lives in the
//! repository layer built on top of this trait, not in the stores.

use async_trait::async_trait;

use crate::{
    error::StorageResult,
    types::{CollectionDescription, CollectionSpec, Item, PrimaryKey},
};

/// Abstract schemaless key-value store.
///
/// Implementations must be thread-safe (`Send + Sync`). The trait is object
/// safe, so repositories can hold either a concrete store or an
/// `Arc<dyn KeyValueStore>`.
///
/// # Operations
///
/// | Method | Plane | Description |
/// |--------|-------|-------------|
/// | [`create_collection`](KeyValueStore::create_collection) | control | Begin creating a collection |
/// | [`describe_collection`](KeyValueStore::describe_collection) | control | Report a collection's state |
/// | [`delete_collection`](KeyValueStore::delete_collection) | control | Begin deleting a collection |
/// | [`put_item`](KeyValueStore::put_item) | data | Store an item, overwriting by key |
/// | [`get_item`](KeyValueStore::get_item) | data | Read an item by key |
/// | [`delete_item`](KeyValueStore::delete_item) | data | Remove an item by key |
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Requests creation of a collection.
    ///
    /// Returns once the request is accepted. The collection is `Creating`
    /// until the store reports it `Active`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::CollectionInUse`](crate::StorageError::CollectionInUse) if a collection
    ///   with the same name exists in any state.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn create_collection(&self, spec: &CollectionSpec) -> StorageResult<()>;

    /// Describes a collection.
    ///
    /// # Errors
    ///
    /// - [`StorageError::CollectionNotFound`](crate::StorageError::CollectionNotFound) if no
    ///   collection with that name exists.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn describe_collection(&self, name: &str) -> StorageResult<CollectionDescription>;

    /// Requests deletion of a collection and all of its items.
    ///
    /// Returns once the request is accepted. The collection is `Deleting`
    /// until the store stops reporting it.
    ///
    /// # Errors
    ///
    /// - [`StorageError::CollectionNotFound`](crate::StorageError::CollectionNotFound) if no
    ///   collection with that name exists.
    /// - [`StorageError::CollectionInUse`](crate::StorageError::CollectionInUse) if the collection
    ///   is still being created or already being deleted.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete_collection(&self, name: &str) -> StorageResult<()>;

    /// Stores an item.
    ///
    /// The item must carry the collection's key attribute as a non-empty
    /// string. An existing item with the same key is replaced entirely
    /// (last write wins, no versioning).
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn put_item(&self, collection: &str, item: Item) -> StorageResult<()>;

    /// Retrieves an item by primary key.
    ///
    /// When `projection` is given, only the named attributes are returned.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(item))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_item(
        &self,
        collection: &str,
        key: &PrimaryKey,
        projection: Option<&[&str]>,
    ) -> StorageResult<Option<Item>>;

    /// Deletes an item by primary key.
    ///
    /// If the key doesn't exist, this is a no-op (returns `Ok(())`).
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete_item(&self, collection: &str, key: &PrimaryKey) -> StorageResult<()>;
}
