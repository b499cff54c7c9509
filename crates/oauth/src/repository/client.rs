use std::{fmt, sync::Arc};

use authkv_storage::{KeyValueStore, PrimaryKey};

use super::{CLIENT_KEY, fetch};
use crate::{
    codec,
    error::{EntityKind, OAuthResult},
    types::Client,
};

/// Stores client registrations.
pub struct ClientRepository<S: ?Sized> {
    store: Arc<S>,
    collection: String,
}

impl<S: KeyValueStore + ?Sized> ClientRepository<S> {
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

    /// Stores a client, replacing any client with the same id.
    ///
    /// # Errors
    ///
    /// Returns a serialization or store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection, client_id = %client.id))]
    pub async fn create(&self, client: &Client) -> OAuthResult<()> {
        let payload = codec::encode(EntityKind::Client, client)?;
        let item = codec::build_item(&PrimaryKey::new(CLIENT_KEY, &client.id), payload, None);
        self.store.put_item(&self.collection, item).await?;
        Ok(())
    }

    /// Loads a client by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no client has this id, or a serialization or
    /// store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection, client_id = %id))]
    pub async fn get(&self, id: &str) -> OAuthResult<Client> {
        let key = PrimaryKey::new(CLIENT_KEY, id);
        let item = fetch(self.store.as_ref(), &self.collection, &key, EntityKind::Client).await?;
        codec::decode(EntityKind::Client, &item)
    }

    /// Removes a client. Removing an unknown id succeeds.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[tracing::instrument(skip_all, fields(collection = %self.collection, client_id = %id))]
    pub async fn remove(&self, id: &str) -> OAuthResult<()> {
        self.store.delete_item(&self.collection, &PrimaryKey::new(CLIENT_KEY, id)).await?;
        Ok(())
    }
}

impl<S: ?Sized> Clone for ClientRepository<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), collection: self.collection.clone() }
    }
}

impl<S: ?Sized> fmt::Debug for ClientRepository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRepository").field("collection", &self.collection).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use authkv_storage::{MemoryStore, testutil::active_store};

    use super::*;

    async fn repository() -> ClientRepository<MemoryStore> {
        let store = active_store(&[("clients", CLIENT_KEY)]).await;
        ClientRepository::new(Arc::new(store), "clients")
    }

    fn client(secret: &str) -> Client {
        Client::builder().id("1234").secret(secret).redirect_uri("http://localhost").build()
    }

    #[tokio::test]
    async fn create_overwrites_existing_client() {
        let repo = repository().await;
        repo.create(&client("first")).await.unwrap();
        repo.create(&client("second")).await.unwrap();

        assert_eq!(repo.get("1234").await.unwrap().secret(), "second");
    }

    #[tokio::test]
    async fn get_unknown_client_is_not_found() {
        let repo = repository().await;
        let err = repo.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.entity(), Some(EntityKind::Client));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let repo = repository().await;
        repo.create(&client("s")).await.unwrap();
        repo.remove("1234").await.unwrap();
        repo.remove("1234").await.unwrap();
        assert!(repo.get("1234").await.unwrap_err().is_not_found());
    }
}
