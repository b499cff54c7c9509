//! Shared test utilities for OAuth storage testing.
//!
//! This module provides sample records, a provisioned in-memory adapter and
//! assertion macros. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! authkv-oauth = { path = "../oauth", features = ["testutil"] }
//! ```
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use authkv_oauth::testutil::{provisioned_storage, sample_client};
//! ```

use std::sync::Arc;

use authkv_storage::MemoryStore;
use chrono::{DateTime, Utc};

use crate::{
    config::StorageConfig,
    storage::KvOAuthStorage,
    types::{AccessToken, AuthorizationCode, Client},
};

/// Redirect URI used by the sample records.
pub const SAMPLE_REDIRECT_URI: &str = "http://localhost:14000/appauth";

/// A client with id `1234` and secret `aabbccdd`.
#[must_use]
pub fn sample_client() -> Client {
    Client::builder().id("1234").secret("aabbccdd").redirect_uri(SAMPLE_REDIRECT_URI).build()
}

/// An authorization code `9999` for `client`, valid for an hour.
#[must_use]
pub fn sample_authorization(client: &Client) -> AuthorizationCode {
    AuthorizationCode::builder()
        .client(client.clone())
        .code("9999")
        .expires_in(3600)
        .redirect_uri(SAMPLE_REDIRECT_URI)
        .state("a")
        .build()
}

/// An access token `9999` with refresh token `r9999` for `client`, valid for
/// an hour.
#[must_use]
pub fn sample_access(client: &Client) -> AccessToken {
    AccessToken::builder()
        .client(client.clone())
        .access_token("9999")
        .refresh_token("r9999")
        .expires_in(3600)
        .redirect_uri(SAMPLE_REDIRECT_URI)
        .build()
}

/// Returns a timestamp `seconds` in the past.
#[must_use]
pub fn seconds_ago(seconds: i64) -> DateTime<Utc> {
    Utc::now() - chrono::TimeDelta::seconds(seconds)
}

/// Builds an adapter over a fresh [`MemoryStore`] and provisions its
/// collections.
///
/// Returns the store too, so tests can inspect raw items.
///
/// # Panics
///
/// Panics if provisioning fails (should not happen with a fresh store).
pub async fn provisioned_storage(
    config: StorageConfig,
) -> (KvOAuthStorage<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let storage = KvOAuthStorage::new(Arc::clone(&store), config);
    storage.schema().provision().await.expect("provision fresh store");
    (storage, store)
}

/// Builds an adapter with prefix `test_` over a fresh, provisioned store.
///
/// # Panics
///
/// Panics if provisioning fails.
pub async fn default_storage() -> KvOAuthStorage<MemoryStore> {
    let config = StorageConfig::with_prefix("test_").expect("valid prefix");
    provisioned_storage(config).await.0
}

/// Assert that an [`OAuthResult`](crate::OAuthResult) is a `NotFound` error
/// for the given entity kind.
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr, $entity:expr) => {
        match $result {
            Err($crate::OAuthStorageError::NotFound { entity, .. }) => assert_eq!(entity, $entity),
            other => panic!("expected NotFound({:?}), got: {other:?}", $entity),
        }
    };
}

/// Assert that an [`OAuthResult`](crate::OAuthResult) is an `Expired` error
/// for the given entity kind.
#[macro_export]
macro_rules! assert_expired {
    ($result:expr, $entity:expr) => {
        match $result {
            Err($crate::OAuthStorageError::Expired { entity }) => assert_eq!(entity, $entity),
            other => panic!("expected Expired({:?}), got: {other:?}", $entity),
        }
    };
}
