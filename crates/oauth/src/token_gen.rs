//! Token generator seams used by a protocol engine.
//!
//! Production generators (random or signed tokens) belong to the engine.
//! The counting generators here produce predictable values for tests and
//! local development: codes `1`, `2`, …; access tokens `1`, `2`, … and
//! refresh tokens `r1`, `r2`, …. Each generator owns its counters, so two
//! generators never share a sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{AccessToken, AuthorizationCode};

/// Generates authorization code values.
pub trait AuthorizeTokenGenerator: Send + Sync {
    /// Returns the code value for a new authorization.
    fn generate_authorize_token(&self, code: &AuthorizationCode) -> String;
}

/// Generates access and refresh token values.
pub trait AccessTokenGenerator: Send + Sync {
    /// Returns the access token and, when `generate_refresh` is set, a
    /// refresh token for a new grant.
    fn generate_access_token(
        &self,
        token: &AccessToken,
        generate_refresh: bool,
    ) -> (String, Option<String>);
}

/// Authorization code generator counting up from `1`.
#[derive(Debug, Default)]
pub struct CountingAuthorizeTokenGenerator {
    counter: AtomicU64,
}

impl CountingAuthorizeTokenGenerator {
    /// Creates a generator whose first code is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthorizeTokenGenerator for CountingAuthorizeTokenGenerator {
    fn generate_authorize_token(&self, _code: &AuthorizationCode) -> String {
        (self.counter.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

/// Access token generator counting up from `1`, with refresh tokens `r1`,
/// `r2`, … counted separately.
#[derive(Debug, Default)]
pub struct CountingAccessTokenGenerator {
    access: AtomicU64,
    refresh: AtomicU64,
}

impl CountingAccessTokenGenerator {
    /// Creates a generator whose first tokens are `1` and `r1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessTokenGenerator for CountingAccessTokenGenerator {
    fn generate_access_token(
        &self,
        _token: &AccessToken,
        generate_refresh: bool,
    ) -> (String, Option<String>) {
        let access = self.access.fetch_add(1, Ordering::Relaxed) + 1;
        let refresh = generate_refresh
            .then(|| format!("r{}", self.refresh.fetch_add(1, Ordering::Relaxed) + 1));
        (access.to_string(), refresh)
    }
}
