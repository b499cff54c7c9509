//! Collection provisioning and teardown.
//!
//! Collection creation and deletion are asynchronous on the store. Each step
//! here issues the request and then waits until the store reports the
//! transition complete before moving to the next collection, so a
//! successful [`provision`](SchemaManager::provision) leaves every
//! collection ready for traffic.
//!
//! These calls take seconds on a real store and belong in deployment
//! tooling or test setup, not on a request path.

use std::{fmt, sync::Arc};

use authkv_storage::{
    CollectionSpec, KeyValueStore, StorageResult,
    waiter::{wait_until_absent, wait_until_active},
    with_retry,
};

use crate::{
    config::{CollectionNames, SchemaConfig},
    error::OAuthResult,
    repository::{ACCESS_KEY, AUTHORIZE_KEY, CLIENT_KEY, REFRESH_KEY},
};

/// Creates and deletes the adapter's collections.
pub struct SchemaManager<S: ?Sized> {
    store: Arc<S>,
    collections: CollectionNames,
    config: SchemaConfig,
}

impl<S: KeyValueStore + ?Sized> SchemaManager<S> {
    /// Creates a manager for `collections`.
    #[must_use]
    pub fn new(store: Arc<S>, collections: CollectionNames, config: SchemaConfig) -> Self {
        Self { store, collections, config }
    }

    /// Creates the access, authorize, client and refresh collections, in that
    /// order, waiting for each to become active.
    ///
    /// The first failure aborts the sequence. Collections created before it
    /// are left in place.
    ///
    /// # Errors
    ///
    /// Returns `Store(CollectionInUse)` if a collection already exists,
    /// `Store(Timeout)` if one does not become active in time, or any other
    /// store error.
    #[tracing::instrument(skip_all, fields(client = %self.collections.client))]
    pub async fn provision(&self) -> OAuthResult<()> {
        let c = &self.collections;
        for (name, key_attribute) in [
            (&c.access, ACCESS_KEY),
            (&c.authorize, AUTHORIZE_KEY),
            (&c.client, CLIENT_KEY),
            (&c.refresh, REFRESH_KEY),
        ] {
            self.create(name, key_attribute).await?;
        }
        Ok(())
    }

    /// Deletes the access, authorize, refresh and client collections, in that
    /// order, waiting for each to disappear.
    ///
    /// The first failure aborts the sequence. Collections deleted before it
    /// stay deleted.
    ///
    /// # Errors
    ///
    /// Returns `Store(CollectionNotFound)` if a collection does not exist,
    /// `Store(Timeout)` if one is not gone in time, or any other store error.
    #[tracing::instrument(skip_all, fields(client = %self.collections.client))]
    pub async fn teardown(&self) -> OAuthResult<()> {
        let c = &self.collections;
        for name in [&c.access, &c.authorize, &c.refresh, &c.client] {
            self.delete(name).await?;
        }
        Ok(())
    }

    /// Returns the collection names this manager operates on.
    #[must_use]
    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }

    async fn create(&self, name: &str, key_attribute: &str) -> StorageResult<()> {
        let spec = CollectionSpec::builder()
            .name(name)
            .key_attribute(key_attribute)
            .throughput(self.config.throughput)
            .build();

        with_retry(&self.config.retry, "create_collection", |attempt| {
            let spec = &spec;
            async move {
                match self.store.create_collection(spec).await {
                    // An earlier attempt may have been applied before its response was lost.
                    Err(err) if attempt > 0 && err.is_collection_in_use() => {
                        tracing::debug!(collection = name, "collection exists after retried create");
                        Ok(())
                    },
                    other => other,
                }
            }
        })
        .await?;
        tracing::info!(collection = name, key_attribute, "collection creation requested");

        wait_until_active(self.store.as_ref(), name, &self.config.wait).await?;
        tracing::info!(collection = name, "collection active");
        Ok(())
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        with_retry(&self.config.retry, "delete_collection", |attempt| async move {
            match self.store.delete_collection(name).await {
                Err(err) if attempt > 0 && err.is_collection_not_found() => {
                    tracing::debug!(collection = name, "collection gone after retried delete");
                    Ok(())
                },
                other => other,
            }
        })
        .await?;
        tracing::info!(collection = name, "collection deletion requested");

        wait_until_absent(self.store.as_ref(), name, &self.config.wait).await?;
        tracing::info!(collection = name, "collection deleted");
        Ok(())
    }
}

impl<S: ?Sized> Clone for SchemaManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collections: self.collections.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for SchemaManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaManager")
            .field("collections", &self.collections)
            .field("config", &self.config)
            .finish()
    }
}
