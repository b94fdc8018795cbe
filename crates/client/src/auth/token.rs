//! In-memory bearer token with expiry tracking.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A bearer token and its absolute expiry instant.
#[derive(Clone)]
pub struct BearerToken {
    /// The raw token value.
    pub value: String,
    /// Server-reported expiry.
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Token with an absolute expiry.
    #[must_use]
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// Token expiring `expires_in` seconds from now.
    #[must_use]
    pub fn from_lifetime(value: String, expires_in: i64) -> Self {
        Self { value, expires_at: Utc::now() + chrono::Duration::seconds(expires_in) }
    }

    /// True when the token is past, or within `buffer` of, its expiry.
    /// A buffer too large to represent counts every token as expired.
    #[must_use]
    pub fn is_expired(&self, buffer: Duration) -> bool {
        chrono::Duration::from_std(buffer)
            .ok()
            .and_then(|buffer| Utc::now().checked_add_signed(buffer))
            .map_or(true, |threshold| threshold >= self.expires_at)
    }

    /// Seconds until expiry; negative when already expired.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

// Token values never appear in debug output.
impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
