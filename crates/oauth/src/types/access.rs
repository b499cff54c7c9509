use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorizationCode, Client, Expiring};
use crate::user_data::UserDataRef;

/// An issued access token.
///
/// The same record is stored under the access token in the access
/// collection and, when a refresh token is present, under the refresh token
/// in the refresh collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct AccessToken {
    /// Snapshot of the client the token was issued to.
    pub client: Client,

    /// The authorization code this token was exchanged from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub authorization: Option<Box<AuthorizationCode>>,

    /// The token this one was refreshed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub previous: Option<Box<AccessToken>>,

    /// The access token value, the key in the access collection.
    #[builder(into)]
    pub access_token: String,

    /// The refresh token value, the key in the refresh collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds.
    pub expires_in: u32,

    /// Granted scope.
    #[builder(into, default)]
    pub scope: String,

    /// Redirect URI of the grant.
    #[builder(into)]
    pub redirect_uri: String,

    /// Issue time.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    /// Application data attached by the embedding server.
    #[serde(default, deserialize_with = "super::present")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserDataRef>,
}

impl AccessToken {
    /// Returns the refresh token if one is set and non-empty.
    #[must_use]
    pub fn refresh_key(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }
}

impl Expiring for AccessToken {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_in(&self) -> u32 {
        self.expires_in
    }
}
