use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A registered client application.
///
/// Clients never expire. The secret is wiped from memory when the record is
/// dropped and is redacted from `Debug` output.
///
/// # Example
///
/// ```
/// use authkv_oauth::Client;
///
/// let client = Client::builder()
///     .id("1234")
///     .secret("aabbccdd")
///     .redirect_uri("http://localhost:14000/appauth")
///     .build();
/// assert!(client.secret_matches("aabbccdd"));
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct Client {
    /// Client identifier.
    #[builder(into)]
    pub id: String,

    #[builder(with = |secret: impl Into<String>| Zeroizing::new(secret.into()))]
    secret: Zeroizing<String>,

    /// Registered redirect URI.
    #[builder(into)]
    pub redirect_uri: String,

    /// Deployment-specific extra fields.
    #[serde(default, deserialize_with = "super::present")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<serde_json::Value>,
}

impl Client {
    /// Returns the client secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns `true` if `candidate` equals the stored secret.
    #[must_use]
    pub fn secret_matches(&self, candidate: &str) -> bool {
        let stored = self.secret.as_bytes();
        let candidate = candidate.as_bytes();
        stored.len() == candidate.len()
            && stored.iter().zip(candidate).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("user_data", &self.user_data)
            .finish()
    }
}
