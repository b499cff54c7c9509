use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Client, Expiring};

/// A short-lived authorization code issued during the code grant.
///
/// PKCE parameters are stored as given and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct AuthorizationCode {
    /// Snapshot of the client the code was issued to.
    pub client: Client,

    /// The code value, also the storage key.
    #[builder(into)]
    pub code: String,

    /// Lifetime in seconds.
    pub expires_in: u32,

    /// Requested scope.
    #[builder(into, default)]
    pub scope: String,

    /// Redirect URI the code was issued for.
    #[builder(into)]
    pub redirect_uri: String,

    /// Opaque state passed by the client.
    #[builder(into, default)]
    pub state: String,

    /// Issue time.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    /// PKCE code challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method (`plain` or `S256`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub code_challenge_method: Option<String>,
}

impl Expiring for AuthorizationCode {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_in(&self) -> u32 {
        self.expires_in
    }
}
