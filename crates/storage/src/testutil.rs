//! Shared test utilities for key-value store testing.
//!
//! This module provides helpers for creating ready-to-use stores, building
//! items, and asserting on [`StorageResult`] values. It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! authkv-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use authkv_storage::testutil::{active_store, make_item};
//! ```

use crate::{
    KeyValueStore,
    error::{StorageError, StorageResult},
    memory::MemoryStore,
    types::{AttributeValue, CollectionSpec, Item},
};

/// Builds an item holding `key_attribute = key` plus the given string
/// attributes.
#[must_use]
pub fn make_item(key_attribute: &str, key: &str, attributes: &[(&str, &str)]) -> Item {
    let mut item = Item::new();
    item.insert(key_attribute.to_owned(), AttributeValue::string(key));
    for (name, value) in attributes {
        item.insert((*name).to_owned(), AttributeValue::string(*value));
    }
    item
}

/// Returns a collection spec with default throughput.
#[must_use]
pub fn collection_spec(name: &str, key_attribute: &str) -> CollectionSpec {
    CollectionSpec::builder().name(name).key_attribute(key_attribute).build()
}

/// Creates a [`MemoryStore`] with each `(name, key_attribute)` collection
/// already active.
///
/// # Panics
///
/// Panics if a collection cannot be created (should not happen with a
/// fresh `MemoryStore`).
pub async fn active_store(collections: &[(&str, &str)]) -> MemoryStore {
    let store = MemoryStore::new();
    for (name, key_attribute) in collections {
        store
            .create_collection(&collection_spec(name, key_attribute))
            .await
            .expect("create collection on fresh store");
    }
    store
}

/// Assert that a [`StorageResult`] is a [`StorageError::CollectionNotFound`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use authkv_storage::assert_collection_not_found;
/// use authkv_storage::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::collection_not_found("clients"));
/// assert_collection_not_found!(result);
/// ```
#[macro_export]
macro_rules! assert_collection_not_found {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CollectionNotFound { .. })),
            "expected StorageError::CollectionNotFound, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CollectionNotFound { .. })),
            "{}: expected StorageError::CollectionNotFound, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is a [`StorageError::CollectionInUse`].
#[macro_export]
macro_rules! assert_collection_in_use {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CollectionInUse { .. })),
            "expected StorageError::CollectionInUse, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::CollectionInUse { .. })),
            "{}: expected StorageError::CollectionInUse, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is `Ok`.
///
/// Returns the inner value on success, panics with a descriptive message
/// on failure.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use authkv_storage::assert_storage_ok;
/// use authkv_storage::StorageResult;
///
/// let result: StorageResult<i32> = Ok(42);
/// let value = assert_storage_ok!(result);
/// assert_eq!(value, 42);
/// ```
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Assert that a [`StorageResult`] contains a [`StorageError::Timeout`].
#[macro_export]
macro_rules! assert_timeout {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::Timeout { .. })),
            "expected StorageError::Timeout, got: {:?}",
            $result,
        );
    };
}

/// Returns `true` if the result is a `Validation` error.
pub fn is_validation<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(StorageError::Validation { .. }))
}
