use std::{fmt, sync::Arc};

use authkv_storage::{KeyValueStore, PrimaryKey};

use super::{AUTHORIZE_KEY, ensure_live, fetch};
use crate::{
    codec,
    error::{EntityKind, OAuthResult},
    types::AuthorizationCode,
};

/// Stores authorization codes.
pub struct AuthorizationCodeRepository<S: ?Sized> {
    store: Arc<S>,
    collection: String,
}

impl<S: KeyValueStore + ?Sized> AuthorizationCodeRepository<S> {
    /// Creates a repository over `collection`.
    #[must_use]
    pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self { store, collection: collection.into() }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Stores an authorization code, replacing any record with the same code.
    ///
    /// # Errors
    ///
    /// Returns a serialization or store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection, client_id = %code.client.id))]
    pub async fn save(&self, code: &AuthorizationCode) -> OAuthResult<()> {
        let payload = codec::encode(EntityKind::AuthorizationCode, code)?;
        let item = codec::build_item(&PrimaryKey::new(AUTHORIZE_KEY, &code.code), payload, None);
        self.store.put_item(&self.collection, item).await?;
        Ok(())
    }

    /// Loads an authorization code.
    ///
    /// The embedded client is returned as stored; it is not re-read from the
    /// client collection.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the code is unknown, `Expired` if its lifetime
    /// has elapsed (the record is left in place), or a serialization or
    /// store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection))]
    pub async fn load(&self, code: &str) -> OAuthResult<AuthorizationCode> {
        let key = PrimaryKey::new(AUTHORIZE_KEY, code);
        let entity = EntityKind::AuthorizationCode;
        let item = fetch(self.store.as_ref(), &self.collection, &key, entity).await?;
        ensure_live(codec::decode(entity, &item)?, entity)
    }

    /// Removes an authorization code. Removing an unknown code succeeds.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection))]
    pub async fn remove(&self, code: &str) -> OAuthResult<()> {
        self.store.delete_item(&self.collection, &PrimaryKey::new(AUTHORIZE_KEY, code)).await?;
        Ok(())
    }
}

impl<S: ?Sized> Clone for AuthorizationCodeRepository<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), collection: self.collection.clone() }
    }
}

impl<S: ?Sized> fmt::Debug for AuthorizationCodeRepository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCodeRepository").field("collection", &self.collection).finish()
    }
}
