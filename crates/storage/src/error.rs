//! Storage error types and result alias.
//!
//! This module defines the error types that can occur during key-value store
//! operations. Every [`KeyValueStore`](crate::KeyValueStore) implementation
//! maps its transport and control-plane failures to these variants.
//!
//! # Error Types
//!
//! - [`StorageError::CollectionNotFound`] - Collection is absent or not yet serving traffic
//! - [`StorageError::CollectionInUse`] - Collection exists or is mid-transition
//! - [`StorageError::Validation`] - Request rejected before execution (bad key, bad item)
//! - [`StorageError::Throttled`] - Provisioned throughput exceeded
//! - [`StorageError::Connection`] - Network or connection-related failures
//! - [`StorageError::Serialization`] - Data encoding/decoding failures
//! - [`StorageError::Internal`] - Backend-specific internal errors
//! - [`StorageError::Timeout`] - A bounded wait ran out of time
//!
//! # Example
//!
//! ```
//! use authkv_storage::{StorageError, StorageResult};
//!
//! fn lookup(collection: &str) -> StorageResult<Vec<u8>> {
//!     Err(StorageError::collection_not_found(collection))
//! }
//! ```

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::types::CollectionStatus;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Diagnostic context attached to [`StorageError::Timeout`].
///
/// Captures what a bounded retry or polling loop was doing when its
/// deadline fired, so operators can tell a slow control plane apart from a
/// wait budget that is simply too short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutContext {
    /// Name of the operation that was being waited on.
    pub operation: String,
    /// Number of attempts that returned before the deadline.
    pub attempts_completed: u32,
    /// Whether the deadline hit while sleeping between attempts.
    pub during_backoff: bool,
    /// Last state or error observed by the loop, if any.
    pub last_observation: Option<String>,
}

impl fmt::Display for TimeoutContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} attempt(s)", self.operation, self.attempts_completed)?;
        if self.during_backoff {
            f.write_str(" (during backoff)")?;
        }
        if let Some(observation) = &self.last_observation {
            write!(f, ", last observed: {observation}")?;
        }
        Ok(())
    }
}

/// Errors that can occur during storage operations.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`: new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The collection does not exist or is not ready for traffic.
    #[error("Collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// The collection already exists or is in the middle of a transition.
    #[error("Collection in use: {name} is {status}")]
    CollectionInUse {
        /// Name of the collection.
        name: String,
        /// Status the collection was in when the request was rejected.
        status: CollectionStatus,
    },

    /// The request was malformed and rejected before execution.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// The store rejected the request because capacity was exceeded.
    #[error("Throughput exceeded: {message}")]
    Throttled {
        /// Description of the throttling condition.
        message: String,
    },

    /// Connection or network error.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Internal storage backend error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },

    /// A bounded wait exceeded its deadline.
    #[error("Operation timed out: {context}")]
    Timeout {
        /// What the loop was doing when the deadline fired.
        context: TimeoutContext,
    },
}

impl StorageError {
    /// Creates a new `CollectionNotFound` error.
    #[must_use]
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates a new `CollectionInUse` error.
    #[must_use]
    pub fn collection_in_use(name: impl Into<String>, status: CollectionStatus) -> Self {
        Self::CollectionInUse { name: name.into(), status }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Creates a new `Throttled` error.
    #[must_use]
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled { message: message.into() }
    }

    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Timeout` error carrying the loop state at expiry.
    #[must_use]
    pub fn timeout(context: TimeoutContext) -> Self {
        Self::Timeout { context }
    }

    /// Returns `true` if retrying the same request may succeed.
    ///
    /// Connection failures, throttling and timeouts are transient. Everything
    /// else reflects the state of the store or the request itself and is
    /// returned to the caller immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Throttled { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if this is a `CollectionNotFound` error.
    #[must_use]
    pub fn is_collection_not_found(&self) -> bool {
        matches!(self, Self::CollectionNotFound { .. })
    }

    /// Returns `true` if this is a `CollectionInUse` error.
    #[must_use]
    pub fn is_collection_in_use(&self) -> bool {
        matches!(self, Self::CollectionInUse { .. })
    }
}

/// Errors raised while validating configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required value was empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A value that must be strictly positive was zero.
    #[error("{field} must be positive, got {value}")]
    MustBePositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, formatted for display.
        value: String,
    },

    /// A lower bound exceeded its paired upper bound.
    #[error("{min_field} ({min}) must not exceed {max_field} ({max})")]
    InvalidRange {
        /// Name of the lower-bound field.
        min_field: &'static str,
        /// The lower-bound value, formatted for display.
        min: String,
        /// Name of the upper-bound field.
        max_field: &'static str,
        /// The upper-bound value, formatted for display.
        max: String,
    },

    /// A name did not satisfy the store's naming rules.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidName {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// Two fields that must differ held the same value.
    #[error("{field} '{value}' is used more than once")]
    Duplicate {
        /// Name of the offending field.
        field: &'static str,
        /// The duplicated value.
        value: String,
    },
}
