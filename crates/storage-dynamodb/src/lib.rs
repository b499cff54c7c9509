//! Amazon DynamoDB implementation of
//! [`KeyValueStore`](authkv_storage::KeyValueStore).
//!
//! This crate provides [`DynamoStore`], the production backend for the
//! OAuth storage adapter. Collections become DynamoDB tables with a single
//! string hash key and provisioned capacity; items map attribute for
//! attribute onto DynamoDB items.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   authkv-oauth                              │
//! │   ClientRepository │ AuthorizationRepository │ Tokens       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   DynamoStore                               │
//! │          (implements KeyValueStore trait)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   aws-sdk-dynamodb                          │
//! │   CreateTable │ DescribeTable │ PutItem │ GetItem │ ...     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Operation Mapping
//!
//! | KeyValueStore                     | DynamoDB                                       |
//! | --------------------------------- | ---------------------------------------------- |
//! | `create_collection(spec)`         | `CreateTable` (hash key `S`, provisioned RCU/WCU) |
//! | `describe_collection(name)`       | `DescribeTable`                                |
//! | `delete_collection(name)`         | `DeleteTable`                                  |
//! | `put_item(name, item)`            | `PutItem`                                      |
//! | `get_item(name, key, projection)` | `GetItem` with `ProjectionExpression`          |
//! | `delete_item(name, key)`          | `DeleteItem`                                   |
//!
//! Table statuses map to [`CollectionStatus`](authkv_storage::CollectionStatus):
//! `CREATING` to `Creating`, `ACTIVE` and `UPDATING` to `Active`, `DELETING`
//! to `Deleting`. Archived or inaccessible tables are reported as internal
//! errors.
//!
//! # Error Mapping
//!
//! | DynamoDB                                          | StorageError         |
//! | ------------------------------------------------- | -------------------- |
//! | `ResourceNotFoundException`                       | `CollectionNotFound` |
//! | `ResourceInUseException`                          | `CollectionInUse`    |
//! | `ProvisionedThroughputExceededException`, `ThrottlingException` | `Throttled` |
//! | `ValidationException`                             | `Validation`         |
//! | dispatch, timeout and response failures           | `Connection`         |
//!
//! # Consistency Model
//!
//! Reads are strongly consistent by default, so a token is readable right
//! after it is saved. Set `consistent_read` to `false` to trade that for
//! cheaper eventually consistent reads.
//!
//! # Quick Start
//!
//! ```no_run
//! // Requires DynamoDB Local on port 8000.
//! use std::sync::Arc;
//!
//! use authkv_oauth::{KvOAuthStorage, OAuthStorage, StorageConfig};
//! use authkv_storage_dynamodb::{DynamoConfig, DynamoStore, StaticCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DynamoConfig::builder()
//!         .region("us-east-1")
//!         .endpoint_url("http://localhost:8000")
//!         .credentials(StaticCredentials::new("local", "local"))
//!         .build()?;
//!     let store = Arc::new(DynamoStore::new(config).await?);
//!
//!     let storage = KvOAuthStorage::try_new(store, StorageConfig::with_prefix("oauth_")?)?;
//!     storage.schema().provision().await?;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod store;

/// Configuration types for the DynamoDB store.
pub use config::{DynamoConfig, MAX_TABLE_NAME_LEN, StaticCredentials};
/// DynamoDB-backed store.
pub use store::DynamoStore;
