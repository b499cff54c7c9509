//! Configuration for the DynamoDB store.

use std::fmt;

use authkv_storage::ConfigError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Longest table name DynamoDB accepts.
pub const MAX_TABLE_NAME_LEN: usize = 255;

/// Static credentials, for DynamoDB Local or deployments without an ambient
/// credential chain.
///
/// The secret and session token are wiped from memory on drop and redacted
/// from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: Zeroizing<String>,
    /// Session token for temporary credentials.
    #[serde(default)]
    pub session_token: Option<Zeroizing<String>>,
}

impl StaticCredentials {
    /// Creates long-term credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
            session_token: None,
        }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Connection and naming settings for [`DynamoStore`](crate::DynamoStore).
///
/// Every collection name is prefixed with `table_prefix` before it reaches
/// DynamoDB, so several deployments (or test runs) can share an account.
///
/// # Example
///
/// ```
/// use authkv_storage_dynamodb::{DynamoConfig, StaticCredentials};
///
/// let config = DynamoConfig::builder()
///     .region("us-east-1")
///     .endpoint_url("http://localhost:8000")
///     .credentials(StaticCredentials::new("local", "local"))
///     .table_prefix("dev.")
///     .build()?;
/// assert_eq!(config.table_name("access"), "dev.access");
/// # Ok::<(), authkv_storage::ConfigError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamoConfig {
    region: String,

    #[serde(default)]
    endpoint_url: Option<String>,

    #[serde(default)]
    credentials: Option<StaticCredentials>,

    #[serde(default)]
    table_prefix: String,

    #[serde(default = "default_consistent_read")]
    consistent_read: bool,
}

fn default_consistent_read() -> bool {
    true
}

#[bon::bon]
impl DynamoConfig {
    /// Creates a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `region` - AWS region of the tables.
    ///
    /// # Optional Fields
    ///
    /// * `endpoint_url` - Endpoint override, e.g. DynamoDB Local.
    /// * `credentials` - Static credentials; the default provider chain is used when absent.
    /// * `table_prefix` - Prepended to every collection name (default: empty).
    /// * `consistent_read` - Use strongly consistent reads (default: `true`).
    ///
    /// # Errors
    ///
    /// Returns any error from [`validate`](Self::validate).
    #[builder]
    pub fn new(
        #[builder(into)] region: String,
        #[builder(into)] endpoint_url: Option<String>,
        credentials: Option<StaticCredentials>,
        #[builder(into, default)] table_prefix: String,
        #[builder(default = true)] consistent_read: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self { region, endpoint_url, credentials, table_prefix, consistent_read };
        config.validate()?;
        Ok(config)
    }

    /// Checks the region, endpoint, credentials and table prefix.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.is_empty() {
            return Err(ConfigError::Empty { field: "region" });
        }
        if self.endpoint_url.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Empty { field: "endpoint_url" });
        }
        if let Some(credentials) = &self.credentials {
            if credentials.access_key_id.is_empty() {
                return Err(ConfigError::Empty { field: "credentials.access_key_id" });
            }
            if credentials.secret_access_key.is_empty() {
                return Err(ConfigError::Empty { field: "credentials.secret_access_key" });
            }
        }
        if !self.table_prefix.chars().all(is_table_name_char) {
            return Err(ConfigError::InvalidName {
                field: "table_prefix",
                value: self.table_prefix.clone(),
                reason: "only letters, digits, '_', '-' and '.' are allowed",
            });
        }
        if self.table_prefix.len() >= MAX_TABLE_NAME_LEN {
            return Err(ConfigError::InvalidName {
                field: "table_prefix",
                value: self.table_prefix.clone(),
                reason: "leaves no room for a collection name",
            });
        }
        Ok(())
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the endpoint override, if any.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Returns the static credentials, if any.
    #[must_use]
    pub fn credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    /// Returns the table prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    /// Returns whether reads are strongly consistent.
    #[must_use]
    pub fn consistent_read(&self) -> bool {
        self.consistent_read
    }

    /// Returns the DynamoDB table name backing `collection`.
    #[must_use]
    pub fn table_name(&self, collection: &str) -> String {
        format!("{}{collection}", self.table_prefix)
    }
}

fn is_table_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}
