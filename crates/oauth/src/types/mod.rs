//! OAuth2 record types persisted by the repositories.
//!
//! Records embed snapshots of the records they reference (a code embeds its
//! client, a token embeds its client and optionally the code it was
//! exchanged from and the token it was refreshed from). Loading a record
//! never follows references into other collections.

mod access;
mod authorize;
mod client;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};

pub use access::AccessToken;
pub use authorize::AuthorizationCode;
pub use client::Client;

/// Deserializes a field that is present into `Some`, JSON `null` included.
///
/// Paired with `#[serde(default)]` so only a missing field reads as `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A record with a lifetime measured from its creation time.
///
/// Expiration is derived, never stored: a record is expired once
/// `created_at + expires_in` is at or before the current time. Expired
/// records stay in the store until they are removed explicitly.
pub trait Expiring {
    /// When the record was issued.
    fn created_at(&self) -> DateTime<Utc>;

    /// Lifetime in seconds.
    fn expires_in(&self) -> u32;

    /// The instant the record stops being valid.
    fn expires_at(&self) -> DateTime<Utc> {
        self.created_at()
            .checked_add_signed(TimeDelta::seconds(i64::from(self.expires_in())))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns `true` if the record is expired at `now`.
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }

    /// Returns `true` if the record is expired now.
    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
