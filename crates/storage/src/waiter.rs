//! Waiting on asynchronous collection transitions.
//!
//! Collection creation and deletion return as soon as the store accepts the
//! request. These helpers poll [`describe_collection`](KeyValueStore::describe_collection)
//! until the transition completes or the configured deadline passes.

use crate::{
    backend::KeyValueStore,
    error::StorageResult,
    retry::{PollOutcome, WaitConfig, poll_until},
    types::CollectionStatus,
};

/// Waits until `name` reports [`CollectionStatus::Active`].
///
/// A collection that is not yet visible counts as still being created;
/// some stores only expose a collection shortly after accepting it.
///
/// # Errors
///
/// Returns [`StorageError::Timeout`](crate::StorageError::Timeout) if the
/// collection is not active before `config.timeout`, or the first
/// non-transient error reported by the store.
pub async fn wait_until_active<S>(store: &S, name: &str, config: &WaitConfig) -> StorageResult<()>
where
    S: KeyValueStore + ?Sized,
{
    let operation = format!("wait_until_active({name})");
    poll_until(config, &operation, || async move {
        match store.describe_collection(name).await {
            Ok(description) if description.status == CollectionStatus::Active => {
                Ok(PollOutcome::Done)
            },
            Ok(description) => Ok(PollOutcome::pending(description.status.to_string())),
            Err(err) if err.is_collection_not_found() => Ok(PollOutcome::pending("NOT_FOUND")),
            Err(err) => Err(err),
        }
    })
    .await?;

    tracing::debug!(collection = name, "collection is active");
    Ok(())
}

/// Waits until `name` no longer exists.
///
/// # Errors
///
/// Returns [`StorageError::Timeout`](crate::StorageError::Timeout) if the
/// collection is still reported before `config.timeout`, or the first
/// non-transient error reported by the store.
pub async fn wait_until_absent<S>(store: &S, name: &str, config: &WaitConfig) -> StorageResult<()>
where
    S: KeyValueStore + ?Sized,
{
    let operation = format!("wait_until_absent({name})");
    poll_until(config, &operation, || async move {
        match store.describe_collection(name).await {
            Ok(description) => Ok(PollOutcome::pending(description.status.to_string())),
            Err(err) if err.is_collection_not_found() => Ok(PollOutcome::Done),
            Err(err) => Err(err),
        }
    })
    .await?;

    tracing::debug!(collection = name, "collection is gone");
    Ok(())
}
