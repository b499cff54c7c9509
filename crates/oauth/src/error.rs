//! OAuth storage error types.
//!
//! Every repository call returns either a decoded record or exactly one
//! [`OAuthStorageError`]. Failures raised by the key-value store are carried
//! unchanged in [`OAuthStorageError::Store`].

use std::{fmt, sync::Arc};

use authkv_storage::{BoxError, ConfigError, StorageError};
use thiserror::Error;

/// Result type alias for OAuth storage operations.
pub type OAuthResult<T> = Result<T, OAuthStorageError>;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A registered client application.
    Client,
    /// A short-lived authorization code.
    AuthorizationCode,
    /// An access token record.
    AccessToken,
    /// The refresh-token mirror of an access token record.
    RefreshToken,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::AuthorizationCode => "authorization code",
            Self::AccessToken => "access token",
            Self::RefreshToken => "refresh token",
        })
    }
}

/// Errors returned by the OAuth repositories.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OAuthStorageError {
    /// No record is stored under the requested key.
    ///
    /// The key is kept for programmatic use but left out of the message,
    /// since it may be a live credential.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of record that was looked up.
        entity: EntityKind,
        /// The key that was looked up.
        key: String,
    },

    /// The record exists but its lifetime has elapsed.
    #[error("{entity} expired")]
    Expired {
        /// Kind of record that expired.
        entity: EntityKind,
    },

    /// A record payload could not be encoded or decoded.
    #[error("failed to serialize {entity}: {message}")]
    Serialization {
        /// Kind of record being converted.
        entity: EntityKind,
        /// Description of the failure.
        message: String,
        /// The underlying codec error.
        #[source]
        source: Option<BoxError>,
    },

    /// The key-value store rejected or failed the request.
    #[error(transparent)]
    Store(#[from] StorageError),

    /// The adapter configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl OAuthStorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound { entity, key: key.into() }
    }

    /// Creates a new `Expired` error.
    #[must_use]
    pub fn expired(entity: EntityKind) -> Self {
        Self::Expired { entity }
    }

    /// Creates a new `Serialization` error from a codec failure.
    #[must_use]
    pub fn serialization(
        entity: EntityKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { entity, message: source.to_string(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with only a message.
    #[must_use]
    pub fn malformed(entity: EntityKind, message: impl Into<String>) -> Self {
        Self::Serialization { entity, message: message.into(), source: None }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an `Expired` error.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }

    /// Returns the kind of record the error refers to, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            Self::NotFound { entity, .. }
            | Self::Expired { entity }
            | Self::Serialization { entity, .. } => Some(*entity),
            Self::Store(_) | Self::Config(_) => None,
        }
    }

    /// Returns the underlying store error, if this error came from the store.
    #[must_use]
    pub fn as_store_error(&self) -> Option<&StorageError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn not_found_message_omits_key() {
        let err = OAuthStorageError::not_found(EntityKind::AccessToken, "9999");
        assert_eq!(err.to_string(), "access token not found");
        assert!(err.is_not_found());
        assert_eq!(err.entity(), Some(EntityKind::AccessToken));
    }

    #[test]
    fn store_errors_pass_through() {
        let err: OAuthStorageError = StorageError::collection_not_found("Accessclient").into();
        assert_eq!(err.to_string(), "Collection not found: Accessclient");
        assert!(err.as_store_error().is_some_and(StorageError::is_collection_not_found));
        assert_eq!(err.entity(), None);
    }

    #[test]
    fn serialization_keeps_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").err();
        let err = match json_err {
            Some(e) => OAuthStorageError::serialization(EntityKind::Client, e),
            None => return,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to serialize client"));
    }
}
