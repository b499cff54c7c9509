//! OAuth2 artifact storage over a schemaless key-value store.
//!
//! This crate persists the four record types of an OAuth2 authorization
//! server (clients, authorization codes, access tokens and refresh tokens)
//! in any [`KeyValueStore`](authkv_storage::KeyValueStore). A protocol
//! engine talks to it through the [`OAuthStorage`] contract.
//!
//! # Layout
//!
//! | Collection | Key attribute | Contents |
//! |------------|---------------|----------|
//! | `{prefix}client` | `id` | [`Client`] |
//! | `{prefix}authorize` | `code` | [`AuthorizationCode`] |
//! | `{prefix}access` | `token` | [`AccessToken`] by access token |
//! | `{prefix}refresh` | `token` | [`AccessToken`] by refresh token |
//!
//! Every item holds the record as JSON in its `payload` attribute.
//! Expiration is checked on load: an expired record yields
//! [`OAuthStorageError::Expired`] but stays stored until removed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use authkv_oauth::{
//!     AccessToken, Client, KvOAuthStorage, OAuthStorage, StorageConfig,
//! };
//! use authkv_storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage =
//!         KvOAuthStorage::new(Arc::new(MemoryStore::new()), StorageConfig::with_prefix("oauth_")?);
//!     storage.schema().provision().await?;
//!
//!     let client = Client::builder().id("1234").secret("aabbccdd").redirect_uri("/cb").build();
//!     let token = AccessToken::builder()
//!         .client(client)
//!         .access_token("9999")
//!         .refresh_token("r9999")
//!         .expires_in(3600)
//!         .redirect_uri("/cb")
//!         .build();
//!     storage.save_access(&token).await?;
//!
//!     assert_eq!(storage.load_refresh("r9999").await?.access_token, "9999");
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (sample records, provisioned in-memory adapter,
//!   assertion macros).
//! - **`failpoints`**: Activates fail points in the underlying store and between the access and
//!   refresh writes of a token save, for fault-injection tests.

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod repository;
pub mod schema;
pub mod storage;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod token_gen;
mod types;
pub mod user_data;

pub use config::{CollectionNames, SchemaConfig, StorageConfig};
pub use error::{EntityKind, OAuthResult, OAuthStorageError};
pub use schema::SchemaManager;
pub use storage::{KvOAuthStorage, OAuthStorage};
pub use token_gen::{
    AccessTokenGenerator, AuthorizeTokenGenerator, CountingAccessTokenGenerator,
    CountingAuthorizeTokenGenerator,
};
pub use types::{AccessToken, AuthorizationCode, Client, Expiring};
pub use user_data::{ProjectAttributes, UserData, UserDataFactory, UserDataRef};
