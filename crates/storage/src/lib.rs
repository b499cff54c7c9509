//! Schemaless key-value store abstraction for the OAuth storage adapter.
//!
//! This crate provides the [`KeyValueStore`] trait and the control-plane
//! helpers built on it. The OAuth repositories in `authkv-oauth` depend only
//! on this trait, so they run unchanged against the in-memory store in tests
//! and against DynamoDB (`authkv-storage-dynamodb`) in production.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OAuth Server                             │
//! │        (authorize, token and refresh endpoints)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   authkv-oauth                              │
//! │   ClientRepository │ AuthorizationRepository │ Tokens       │
//! │     (entity encoding, expiration, schema lifecycle)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 authkv-storage                              │
//! │              KeyValueStore trait                            │
//! │  (put_item, get_item, delete_item, create/describe/delete)  │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryStore  │   DynamoStore (authkv-storage-dynamodb)      │
//! │  (testing)   │              (production)                    │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use authkv_storage::{
//!     CollectionSpec, KeyValueStore, MemoryStore, PrimaryKey, WaitConfig, waiter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!
//!     let spec = CollectionSpec::builder().name("Accessaccess").key_attribute("token").build();
//!     store.create_collection(&spec).await?;
//!     waiter::wait_until_active(&store, "Accessaccess", &WaitConfig::default()).await?;
//!
//!     let mut item = authkv_storage::Item::new();
//!     item.insert("token".into(), "9999".into());
//!     store.put_item("Accessaccess", item).await?;
//!
//!     let key = PrimaryKey::new("token", "9999");
//!     assert!(store.get_item("Accessaccess", &key, None).await?.is_some());
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Store
//!
//! 1. Implement the [`KeyValueStore`] trait
//! 2. Map transport and control-plane errors to [`StorageError`]
//! 3. Run the [`conformance`] suite against it
//!
//! See the [`memory`] module source for a reference implementation.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` and `conformance` modules (item builders, store
//!   factories, assertion macros, contract checks). Enable this in `[dev-dependencies]` for
//!   integration tests.
//! - **`failpoints`**: Activates the `fail` crate injection points in the in-memory store and the
//!   retry loops.

#![deny(unsafe_code)]

pub mod backend;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod conformance;
pub mod error;
pub mod memory;
pub mod retry;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod types;
pub mod waiter;

// Re-export primary types at crate root for convenience
pub use backend::KeyValueStore;
pub use error::{BoxError, ConfigError, StorageError, StorageResult, TimeoutContext};
pub use memory::MemoryStore;
pub use retry::{PollOutcome, RetryConfig, WaitConfig, poll_until, with_retry};
pub use types::{
    AttributeValue, CollectionDescription, CollectionSpec, CollectionStatus, Item, PrimaryKey,
    Throughput,
};
