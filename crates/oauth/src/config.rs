//! Configuration for the OAuth storage adapter.
//!
//! [`StorageConfig`] names the four collections, carries the schema
//! provisioning policy and optionally the [`UserDataFactory`] applied when
//! tokens are loaded.

use std::collections::HashSet;

use authkv_storage::{ConfigError, RetryConfig, Throughput, WaitConfig};
use serde::{Deserialize, Serialize};

use crate::user_data::UserDataFactory;

/// Minimum collection name length accepted by the store.
pub const MIN_COLLECTION_NAME_LEN: usize = 3;

/// Maximum collection name length accepted by the store.
pub const MAX_COLLECTION_NAME_LEN: usize = 255;

/// Names of the four collections used by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionNames {
    /// Client records, keyed by `id`.
    pub client: String,
    /// Authorization codes, keyed by `code`.
    pub authorize: String,
    /// Access tokens, keyed by `token`.
    pub access: String,
    /// Refresh-token mirrors, keyed by `token`.
    pub refresh: String,
}

impl CollectionNames {
    /// Derives the names `{prefix}client`, `{prefix}authorize`,
    /// `{prefix}access` and `{prefix}refresh`.
    ///
    /// ```
    /// use authkv_oauth::CollectionNames;
    ///
    /// let names = CollectionNames::with_prefix("oauth_");
    /// assert_eq!(names.access, "oauth_access");
    /// ```
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            client: format!("{prefix}client"),
            authorize: format!("{prefix}authorize"),
            access: format!("{prefix}access"),
            refresh: format!("{prefix}refresh"),
        }
    }

    fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("collections.client", &self.client),
            ("collections.authorize", &self.authorize),
            ("collections.access", &self.access),
            ("collections.refresh", &self.refresh),
        ]
    }

    /// Checks the store's naming rules and that all four names differ.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidName`] for a name outside 3-255
    /// characters of `[A-Za-z0-9_.-]`, or [`ConfigError::Duplicate`] if two
    /// collections share a name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (field, name) in self.entries() {
            validate_collection_name(field, name)?;
            if !seen.insert(name) {
                return Err(ConfigError::Duplicate { field, value: name.to_owned() });
            }
        }
        Ok(())
    }
}

fn validate_collection_name(field: &'static str, name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidName { field, value: name.to_owned(), reason };
    if !(MIN_COLLECTION_NAME_LEN..=MAX_COLLECTION_NAME_LEN).contains(&name.len()) {
        return Err(invalid("must be between 3 and 255 characters"));
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')) {
        return Err(invalid("may only contain letters, digits, '_', '-' and '.'"));
    }
    Ok(())
}

/// Provisioning policy for [`SchemaManager`](crate::SchemaManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Capacity requested for each collection.
    #[serde(default)]
    pub throughput: Throughput,

    /// Retry policy for create and delete requests.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Deadline and pacing for readiness waits.
    #[serde(default)]
    pub wait: WaitConfig,
}

impl SchemaConfig {
    /// Validates the retry and wait policies.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.throughput.read_capacity_units == 0 {
            return Err(ConfigError::MustBePositive {
                field: "schema.throughput.read_capacity_units",
                value: "0".into(),
            });
        }
        if self.throughput.write_capacity_units == 0 {
            return Err(ConfigError::MustBePositive {
                field: "schema.throughput.write_capacity_units",
                value: "0".into(),
            });
        }
        self.retry.validate()?;
        self.wait.validate()
    }
}

/// Configuration for [`KvOAuthStorage`](crate::KvOAuthStorage).
///
/// # Example
///
/// ```
/// use authkv_oauth::StorageConfig;
///
/// let config = StorageConfig::builder().prefix("oauth_").build()?;
/// assert_eq!(config.collections().client, "oauth_client");
/// # Ok::<(), authkv_storage::ConfigError>(())
/// ```
///
/// Deserializing from a file requires explicit collection names; the
/// user-data factory can only be set in code.
///
/// ```
/// use authkv_oauth::StorageConfig;
///
/// let config: StorageConfig = serde_json::from_str(r#"{
///     "collections": {
///         "client": "oauth_client",
///         "authorize": "oauth_authorize",
///         "access": "oauth_access",
///         "refresh": "oauth_refresh"
///     },
///     "schema": { "wait": { "timeout": "2m" } }
/// }"#)?;
/// config.validate()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub(crate) collections: CollectionNames,

    #[serde(default)]
    pub(crate) schema: SchemaConfig,

    #[serde(skip)]
    pub(crate) user_data_factory: Option<UserDataFactory>,
}

#[bon::bon]
impl StorageConfig {
    /// Creates a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Derives the collection names via [`CollectionNames::with_prefix`].
    /// * `collections` - Explicit collection names; takes precedence over `prefix`.
    ///
    /// # Optional Fields
    ///
    /// * `schema` - Provisioning policy (default: [`SchemaConfig::default`]).
    /// * `user_data_factory` - Reconstruction hook applied when tokens are loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] if neither `prefix` nor `collections`
    /// is given, or any error from [`validate`](Self::validate).
    #[builder]
    pub fn new(
        #[builder(into)] prefix: Option<String>,
        collections: Option<CollectionNames>,
        #[builder(default)] schema: SchemaConfig,
        user_data_factory: Option<UserDataFactory>,
    ) -> Result<Self, ConfigError> {
        let collections = match (collections, prefix) {
            (Some(collections), _) => collections,
            (None, Some(prefix)) => CollectionNames::with_prefix(&prefix),
            (None, None) => return Err(ConfigError::Empty { field: "prefix" }),
        };
        let config = Self { collections, schema, user_data_factory };
        config.validate()?;
        Ok(config)
    }

    /// Creates a validated configuration with default schema policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a derived collection name is invalid.
    pub fn with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::builder().prefix(prefix).build()
    }

    /// Checks collection names and the schema policy.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collections.validate()?;
        self.schema.validate()
    }

    /// Returns the collection names.
    #[must_use]
    pub fn collections(&self) -> &CollectionNames {
        &self.collections
    }

    /// Returns the schema provisioning policy.
    #[must_use]
    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Returns the user-data reconstruction hook, if configured.
    #[must_use]
    pub fn user_data_factory(&self) -> Option<&UserDataFactory> {
        self.user_data_factory.as_ref()
    }

    /// Sets the user-data reconstruction hook.
    #[must_use]
    pub fn with_user_data_factory(mut self, factory: UserDataFactory) -> Self {
        self.user_data_factory = Some(factory);
        self
    }
}
