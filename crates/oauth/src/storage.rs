//! The storage contract consumed by an OAuth2 protocol engine.
//!
//! [`OAuthStorage`] is the fixed set of twelve operations a protocol engine
//! calls to persist and look up clients, authorization codes and tokens.
//! [`KvOAuthStorage`] implements it on top of any [`KeyValueStore`].

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use authkv_storage::KeyValueStore;

use crate::{
    config::StorageConfig,
    error::OAuthResult,
    repository::{AuthorizationCodeRepository, ClientRepository, TokenRepository},
    schema::SchemaManager,
    types::{AccessToken, AuthorizationCode, Client},
};

/// Persistence operations required by an OAuth2 protocol engine.
///
/// Every load returns either a live record or exactly one error: `NotFound`
/// when the key is unknown, `Expired` when the record's lifetime has
/// elapsed, or a serialization or store failure. Removes of unknown keys
/// succeed.
#[async_trait]
pub trait OAuthStorage: Send + Sync {
    /// Stores a client, replacing any client with the same id.
    async fn create_client(&self, client: &Client) -> OAuthResult<()>;

    /// Loads a client by id.
    async fn get_client(&self, id: &str) -> OAuthResult<Client>;

    /// Removes a client.
    async fn remove_client(&self, id: &str) -> OAuthResult<()>;

    /// Stores an authorization code.
    async fn save_authorize(&self, code: &AuthorizationCode) -> OAuthResult<()>;

    /// Loads an authorization code.
    async fn load_authorize(&self, code: &str) -> OAuthResult<AuthorizationCode>;

    /// Removes an authorization code.
    async fn remove_authorize(&self, code: &str) -> OAuthResult<()>;

    /// Stores an access token and, when it has a refresh token, its mirror.
    async fn save_access(&self, token: &AccessToken) -> OAuthResult<()>;

    /// Loads an access token.
    async fn load_access(&self, token: &str) -> OAuthResult<AccessToken>;

    /// Removes an access token.
    async fn remove_access(&self, token: &str) -> OAuthResult<()>;

    /// Stores a token under its refresh token.
    async fn save_refresh(&self, token: &AccessToken) -> OAuthResult<()>;

    /// Loads the token stored under a refresh token.
    async fn load_refresh(&self, token: &str) -> OAuthResult<AccessToken>;

    /// Removes a refresh token.
    async fn remove_refresh(&self, token: &str) -> OAuthResult<()>;
}

/// [`OAuthStorage`] backed by a [`KeyValueStore`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use authkv_oauth::{Client, KvOAuthStorage, OAuthStorage, StorageConfig};
/// use authkv_storage::MemoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StorageConfig::with_prefix("oauth_")?;
///     let storage = KvOAuthStorage::new(Arc::new(MemoryStore::new()), config);
///     storage.schema().provision().await?;
///
///     let client = Client::builder()
///         .id("1234")
///         .secret("aabbccdd")
///         .redirect_uri("http://localhost:14000/appauth")
///         .build();
///     storage.create_client(&client).await?;
///     assert_eq!(storage.get_client("1234").await?, client);
///     Ok(())
/// }
/// ```
pub struct KvOAuthStorage<S: ?Sized> {
    clients: ClientRepository<S>,
    authorizations: AuthorizationCodeRepository<S>,
    tokens: TokenRepository<S>,
    schema: SchemaManager<S>,
}

impl<S: KeyValueStore + ?Sized> KvOAuthStorage<S> {
    /// Creates the adapter over `store`.
    ///
    /// The configuration is expected to be valid; use
    /// [`StorageConfig::validate`] after deserializing one.
    #[must_use]
    pub fn new(store: Arc<S>, config: StorageConfig) -> Self {
        let StorageConfig { collections, schema, user_data_factory } = config;
        Self {
            clients: ClientRepository::new(Arc::clone(&store), &collections.client),
            authorizations: AuthorizationCodeRepository::new(
                Arc::clone(&store),
                &collections.authorize,
            ),
            tokens: TokenRepository::new(
                Arc::clone(&store),
                &collections.access,
                &collections.refresh,
                user_data_factory,
            ),
            schema: SchemaManager::new(store, collections, schema),
        }
    }

    /// Validates `config` and creates the adapter over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthStorageError::Config`](crate::OAuthStorageError::Config)
    /// if the configuration is invalid.
    pub fn try_new(store: Arc<S>, config: StorageConfig) -> OAuthResult<Self> {
        config.validate()?;
        Ok(Self::new(store, config))
    }

    /// Returns the schema manager for provisioning and teardown.
    #[must_use]
    pub fn schema(&self) -> &SchemaManager<S> {
        &self.schema
    }

    /// Returns the client repository.
    #[must_use]
    pub fn clients(&self) -> &ClientRepository<S> {
        &self.clients
    }

    /// Returns the authorization code repository.
    #[must_use]
    pub fn authorizations(&self) -> &AuthorizationCodeRepository<S> {
        &self.authorizations
    }

    /// Returns the token repository.
    #[must_use]
    pub fn tokens(&self) -> &TokenRepository<S> {
        &self.tokens
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> OAuthStorage for KvOAuthStorage<S> {
    async fn create_client(&self, client: &Client) -> OAuthResult<()> {
        self.clients.create(client).await
    }

    async fn get_client(&self, id: &str) -> OAuthResult<Client> {
        self.clients.get(id).await
    }

    async fn remove_client(&self, id: &str) -> OAuthResult<()> {
        self.clients.remove(id).await
    }

    async fn save_authorize(&self, code: &AuthorizationCode) -> OAuthResult<()> {
        self.authorizations.save(code).await
    }

    async fn load_authorize(&self, code: &str) -> OAuthResult<AuthorizationCode> {
        self.authorizations.load(code).await
    }

    async fn remove_authorize(&self, code: &str) -> OAuthResult<()> {
        self.authorizations.remove(code).await
    }

    async fn save_access(&self, token: &AccessToken) -> OAuthResult<()> {
        self.tokens.save_access(token).await
    }

    async fn load_access(&self, token: &str) -> OAuthResult<AccessToken> {
        self.tokens.load_access(token).await
    }

    async fn remove_access(&self, token: &str) -> OAuthResult<()> {
        self.tokens.remove_access(token).await
    }

    async fn save_refresh(&self, token: &AccessToken) -> OAuthResult<()> {
        self.tokens.save_refresh(token).await
    }

    async fn load_refresh(&self, token: &str) -> OAuthResult<AccessToken> {
        self.tokens.load_refresh(token).await
    }

    async fn remove_refresh(&self, token: &str) -> OAuthResult<()> {
        self.tokens.remove_refresh(token).await
    }
}

impl<S: ?Sized> Clone for KvOAuthStorage<S> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            authorizations: self.authorizations.clone(),
            tokens: self.tokens.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for KvOAuthStorage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvOAuthStorage")
            .field("clients", &self.clients)
            .field("authorizations", &self.authorizations)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
