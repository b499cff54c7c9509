//! Fail-point tests for partial writes and transient provisioning failures.
//!
//! These tests require the `failpoints` feature:
//! ```bash
//! cargo test -p authkv-oauth --features failpoints --test failpoint_tests
//! ```

#![allow(clippy::expect_used, clippy::panic)]

use std::{sync::Arc, time::Duration};

use authkv_oauth::{
    EntityKind, KvOAuthStorage, OAuthStorage, OAuthStorageError, SchemaConfig, StorageConfig,
    assert_not_found,
    testutil::{default_storage, sample_access, sample_client},
};
use authkv_storage::{MemoryStore, RetryConfig, StorageError};

#[tokio::test]
async fn failure_before_refresh_mirror_leaves_access_record() {
    let scenario = fail::FailScenario::setup();
    let storage = default_storage().await;
    fail::cfg("token-before-refresh-mirror", "return").expect("failed to configure fail point");

    let err = storage
        .save_access(&sample_access(&sample_client()))
        .await
        .expect_err("mirror write should fail");
    assert!(
        matches!(err, OAuthStorageError::Store(StorageError::Connection { .. })),
        "unexpected error: {err:?}"
    );

    scenario.teardown();

    storage.load_access("9999").await.expect("access record was not rolled back");
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);
}

#[tokio::test]
async fn store_put_failure_surfaces_as_store_error() {
    let scenario = fail::FailScenario::setup();
    let storage = default_storage().await;
    fail::cfg("memory-put-item", "return").expect("failed to configure fail point");

    let result = storage.create_client(&sample_client()).await;
    assert!(
        matches!(result, Err(OAuthStorageError::Store(StorageError::Connection { .. }))),
        "unexpected result: {result:?}"
    );

    scenario.teardown();
}

#[tokio::test]
async fn provision_retries_transient_create_failure() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("memory-create-collection", "1*return").expect("failed to configure fail point");

    let schema = SchemaConfig {
        retry: RetryConfig::builder()
            .initial_backoff(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(5))
            .build()
            .expect("valid retry config"),
        ..SchemaConfig::default()
    };
    let config =
        StorageConfig::builder().prefix("retry_").schema(schema).build().expect("valid config");
    let storage = KvOAuthStorage::new(Arc::new(MemoryStore::new()), config);

    storage.schema().provision().await.expect("single transient failure is retried");
    storage.create_client(&sample_client()).await.expect("collections usable");

    scenario.teardown();
}

#[tokio::test]
async fn provision_gives_up_after_retry_budget() {
    let scenario = fail::FailScenario::setup();
    fail::cfg("memory-create-collection", "return").expect("failed to configure fail point");

    let schema = SchemaConfig {
        retry: RetryConfig::builder()
            .max_retries(2)
            .initial_backoff(Duration::from_millis(1))
            .max_backoff(Duration::from_millis(2))
            .build()
            .expect("valid retry config"),
        ..SchemaConfig::default()
    };
    let config =
        StorageConfig::builder().prefix("budget_").schema(schema).build().expect("valid config");
    let storage = KvOAuthStorage::new(Arc::new(MemoryStore::new()), config);

    let err = storage.schema().provision().await.expect_err("persistent failure");
    assert!(err.as_store_error().is_some_and(StorageError::is_transient), "{err:?}");

    scenario.teardown();
}
