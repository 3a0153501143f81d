//! Session marker types.
//!
//! A session record is the client's memory of a login: the opaque token the
//! backend handed out, when it was handed out, when it was last used for a
//! navigation that passed the gate, and a cached copy of the user profile.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EpochMillis
// ---------------------------------------------------------------------------

/// Wall-clock milliseconds since the Unix epoch.
///
/// Expiry windows are absolute millisecond spans, not calendar-aware, so a
/// plain integer is all we need. Newtyped so an age in milliseconds can't be
/// confused with a timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpochMillis(pub u64);

impl EpochMillis {
    /// Reads the system clock. A clock set before 1970 reads as the epoch.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is
    /// in the future.
    pub fn millis_since(self, earlier: EpochMillis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns this timestamp shifted forward by `millis`.
    pub fn plus_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// StoredTimestamp
// ---------------------------------------------------------------------------

/// A timestamp exactly as it was found in storage.
///
/// Storage is a string medium, and anything (an older build, a user poking
/// at the file) may have written there. We keep the raw text and let the
/// caller decide what to do when [`parse`](Self::parse) fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTimestamp(String);

impl StoredTimestamp {
    /// Wraps a raw stored value.
    pub fn raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parses the value as a non-negative decimal integer.
    ///
    /// Surrounding whitespace is tolerated; anything else (signs, decimals,
    /// trailing garbage, overflow) yields `None`.
    pub fn parse(&self) -> Option<EpochMillis> {
        self.0.trim().parse::<u64>().ok().map(EpochMillis)
    }

    /// The stored text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<EpochMillis> for StoredTimestamp {
    fn from(ts: EpochMillis) -> Self {
        Self(ts.to_string())
    }
}

// ---------------------------------------------------------------------------
// CachedUser
// ---------------------------------------------------------------------------

/// The role string that grants access to admin-only routes.
pub const ADMIN_ROLE: &str = "admin";

/// Cached copy of the logged-in user's profile.
///
/// Derived from the login response, never authoritative: it is only used to
/// hide admin routes from non-admins on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: String,
}

impl CachedUser {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// Everything persisted about one logical login.
///
/// A record only exists when the token and both timestamps are present. The
/// store never hands out a record with a missing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Opaque credential sent as a bearer token.
    pub token: String,

    /// When the token was acquired.
    pub issued_at: StoredTimestamp,

    /// When a navigation last passed the gate with this token.
    pub last_activity: StoredTimestamp,

    /// Cached profile, `None` if never stored or unreadable.
    pub user: Option<CachedUser>,
}

impl SessionRecord {
    /// Creates the record written right after a successful login: issue
    /// time and last activity are both `now`.
    pub fn issued(token: impl Into<String>, now: EpochMillis, user: Option<CachedUser>) -> Self {
        Self {
            token: token.into(),
            issued_at: now.into(),
            last_activity: now.into(),
            user,
        }
    }

    /// Returns a copy with `last_activity` replaced.
    pub fn with_last_activity(&self, at: EpochMillis) -> Self {
        Self {
            last_activity: at.into(),
            ..self.clone()
        }
    }
}
