//! Repositories for the four OAuth record types.
//!
//! Each repository owns one or two collections of a [`KeyValueStore`] and
//! maps records to items through the [`codec`](crate::codec). All lookups
//! are by exact primary key; each call is a single awaited request, or two
//! sequential requests for the access/refresh mirror.

mod authorize;
mod client;
mod token;

use authkv_storage::{Item, KeyValueStore, PrimaryKey};
use chrono::Utc;

pub use self::{authorize::AuthorizationCodeRepository, client::ClientRepository, token::TokenRepository};
use crate::{
    codec::PAYLOAD_ATTRIBUTE,
    error::{EntityKind, OAuthResult, OAuthStorageError},
    types::Expiring,
};

/// Key attribute of the client collection.
pub const CLIENT_KEY: &str = "id";

/// Key attribute of the authorization code collection.
pub const AUTHORIZE_KEY: &str = "code";

/// Key attribute of the access token collection.
pub const ACCESS_KEY: &str = "token";

/// Key attribute of the refresh token collection.
pub const REFRESH_KEY: &str = "token";

/// Reads the key and payload of an item, or `NotFound` when absent.
async fn fetch<S>(
    store: &S,
    collection: &str,
    key: &PrimaryKey,
    entity: EntityKind,
) -> OAuthResult<Item>
where
    S: KeyValueStore + ?Sized,
{
    let projection = [key.attribute.as_str(), PAYLOAD_ATTRIBUTE];
    store
        .get_item(collection, key, Some(projection.as_slice()))
        .await?
        .ok_or_else(|| OAuthStorageError::not_found(entity, &key.value))
}

/// Rejects a record whose lifetime has elapsed.
fn ensure_live<T: Expiring>(record: T, entity: EntityKind) -> OAuthResult<T> {
    if record.is_expired_at(Utc::now()) {
        tracing::debug!(%entity, expires_at = %record.expires_at(), "record expired");
        return Err(OAuthStorageError::expired(entity));
    }
    Ok(record)
}
