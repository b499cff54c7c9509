use std::{fmt, sync::Arc};

use authkv_storage::{Item, KeyValueStore, PrimaryKey, StorageError};
use fail::fail_point;

use super::{ACCESS_KEY, REFRESH_KEY, ensure_live, fetch};
use crate::{
    codec,
    error::{EntityKind, OAuthResult, OAuthStorageError},
    types::AccessToken,
    user_data::UserDataFactory,
};

/// Stores access tokens and their refresh-token mirrors.
///
/// A token with a refresh token is written twice: under the access token in
/// the access collection, then under the refresh token in the refresh
/// collection. The two writes are sequential and independent. If the second
/// one fails, the first is not rolled back.
pub struct TokenRepository<S: ?Sized> {
    store: Arc<S>,
    access_collection: String,
    refresh_collection: String,
    user_data_factory: Option<UserDataFactory>,
}

impl<S: KeyValueStore + ?Sized> TokenRepository<S> {
    /// Creates a repository over the access and refresh collections.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        access_collection: impl Into<String>,
        refresh_collection: impl Into<String>,
        user_data_factory: Option<UserDataFactory>,
    ) -> Self {
        Self {
            store,
            access_collection: access_collection.into(),
            refresh_collection: refresh_collection.into(),
            user_data_factory,
        }
    }

    /// Returns the access collection name.
    #[must_use]
    pub fn access_collection(&self) -> &str {
        &self.access_collection
    }

    /// Returns the refresh collection name.
    #[must_use]
    pub fn refresh_collection(&self) -> &str {
        &self.refresh_collection
    }

    /// Stores an access token and, if it carries a non-empty refresh token,
    /// its refresh mirror.
    ///
    /// # Errors
    ///
    /// Returns the first failing write. A failure of the mirror write is
    /// returned even though the access record has been stored.
    #[tracing::instrument(skip_all, fields(collection = %self.access_collection, client_id = %token.client.id))]
    pub async fn save_access(&self, token: &AccessToken) -> OAuthResult<()> {
        let entity = EntityKind::AccessToken;
        let key = PrimaryKey::new(ACCESS_KEY, &token.access_token);
        let item = codec::build_item(&key, codec::encode(entity, token)?, projected(token));
        self.store.put_item(&self.access_collection, item).await?;

        if token.refresh_key().is_some() {
            fail_point!("token-before-refresh-mirror", |_| {
                Err(OAuthStorageError::from(StorageError::connection(
                    "injected failure before refresh mirror write",
                )))
            });
            if let Err(err) = self.save_refresh(token).await {
                tracing::warn!(
                    collection = %self.refresh_collection,
                    error = %err,
                    "refresh mirror write failed after access record was stored",
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Loads an access token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token is unknown, `Expired` if its lifetime
    /// has elapsed (the record is left in place), or a serialization or
    /// store error.
    #[tracing::instrument(skip_all, fields(collection = %self.access_collection))]
    pub async fn load_access(&self, token: &str) -> OAuthResult<AccessToken> {
        self.load(&self.access_collection, PrimaryKey::new(ACCESS_KEY, token), EntityKind::AccessToken)
            .await
    }

    /// Removes an access token. The refresh mirror is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[tracing::instrument(skip_all, fields(collection = %self.access_collection))]
    pub async fn remove_access(&self, token: &str) -> OAuthResult<()> {
        let key = PrimaryKey::new(ACCESS_KEY, token);
        self.store.delete_item(&self.access_collection, &key).await?;
        Ok(())
    }

    /// Stores the refresh mirror of an access token under its refresh token.
    ///
    /// # Errors
    ///
    /// Returns a serialization or store error. A token without a refresh
    /// token is rejected by the store as an empty key.
    #[tracing::instrument(skip_all, fields(collection = %self.refresh_collection, client_id = %token.client.id))]
    pub async fn save_refresh(&self, token: &AccessToken) -> OAuthResult<()> {
        let entity = EntityKind::RefreshToken;
        let key = PrimaryKey::new(REFRESH_KEY, token.refresh_token.as_deref().unwrap_or_default());
        let item = codec::build_item(&key, codec::encode(entity, token)?, projected(token));
        self.store.put_item(&self.refresh_collection, item).await?;
        Ok(())
    }

    /// Loads the access token record stored under a refresh token.
    ///
    /// Expiry follows the access token's lifetime.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the refresh token is unknown, `Expired` if the
    /// record's lifetime has elapsed, or a serialization or store error.
    #[tracing::instrument(skip_all, fields(collection = %self.refresh_collection))]
    pub async fn load_refresh(&self, token: &str) -> OAuthResult<AccessToken> {
        self.load(
            &self.refresh_collection,
            PrimaryKey::new(REFRESH_KEY, token),
            EntityKind::RefreshToken,
        )
        .await
    }

    /// Removes a refresh mirror. The access record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[tracing::instrument(skip_all, fields(collection = %self.refresh_collection))]
    pub async fn remove_refresh(&self, token: &str) -> OAuthResult<()> {
        let key = PrimaryKey::new(REFRESH_KEY, token);
        self.store.delete_item(&self.refresh_collection, &key).await?;
        Ok(())
    }

    async fn load(
        &self,
        collection: &str,
        key: PrimaryKey,
        entity: EntityKind,
    ) -> OAuthResult<AccessToken> {
        let item = fetch(self.store.as_ref(), collection, &key, entity).await?;
        let mut token: AccessToken = codec::decode(entity, &item)?;

        if let Some(factory) = &self.user_data_factory
            && let Some(raw) = &token.user_data
        {
            let rebuilt = factory
                .reconstruct(raw)
                .map_err(|e| OAuthStorageError::serialization(entity, e))?;
            token.user_data = Some(rebuilt);
        }

        ensure_live(token, entity)
    }
}

/// Extension attributes contributed by the token's user data.
fn projected(token: &AccessToken) -> Option<Item> {
    token
        .user_data
        .as_ref()
        .and_then(|data| data.as_attributes())
        .map(|projection| projection.project_attributes())
}

impl<S: ?Sized> Clone for TokenRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            access_collection: self.access_collection.clone(),
            refresh_collection: self.refresh_collection.clone(),
            user_data_factory: self.user_data_factory.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for TokenRepository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRepository")
            .field("access_collection", &self.access_collection)
            .field("refresh_collection", &self.refresh_collection)
            .field("user_data_factory", &self.user_data_factory)
            .finish()
    }
}
