//! Expiry policy: the two windows a session must stay inside.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One day in milliseconds. Windows are absolute spans, not calendar days.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// How long a session may live.
///
/// A session is usable only while BOTH hold:
/// - the token is no older than `max_age` (absolute expiry)
/// - the last valid navigation is no older than `max_inactivity`
///   (inactivity expiry)
///
/// Exactly hitting a limit is still valid; only exceeding it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    /// Maximum time since the token was issued.
    pub max_age: Duration,

    /// Maximum time since the last valid navigation.
    pub max_inactivity: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_millis(30 * DAY_MS),
            max_inactivity: Duration::from_millis(7 * DAY_MS),
        }
    }
}

impl ExpiryPolicy {
    pub fn new(max_age: Duration, max_inactivity: Duration) -> Self {
        Self {
            max_age,
            max_inactivity,
        }
    }

    pub fn max_age_ms(&self) -> u64 {
        saturating_millis(self.max_age)
    }

    pub fn max_inactivity_ms(&self) -> u64 {
        saturating_millis(self.max_inactivity)
    }
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
