//! Guard configuration.

use std::str::FromStr;
use std::time::Duration;

use routegate_session::ExpiryPolicy;
use serde::{Deserialize, Serialize};

use crate::route::LOGIN_ROUTE;

/// Whether the guard consults the backend after the local checks pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// Local expiry checks only. Decisions are immediate.
    #[default]
    LocalOnly,
    /// Local checks, then one verification round-trip per protected
    /// navigation.
    RemoteVerify,
}

impl FromStr for GuardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "local_only" => Ok(Self::LocalOnly),
            "remote" | "remote_verify" => Ok(Self::RemoteVerify),
            other => Err(format!("unknown guard mode {other:?} (expected local or remote)")),
        }
    }
}

/// Configuration for a [`RouteGuard`](crate::RouteGuard).
///
/// Sensible defaults are provided; override just the fields you need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub mode: GuardMode,

    /// Expiry windows applied on every protected navigation.
    pub policy: ExpiryPolicy,

    /// Longest the guard waits for the verifier before failing closed.
    ///
    /// Default: 10 seconds.
    pub verify_timeout: Duration,

    /// Name of the login route. Logged-in users are sent home from it.
    pub login_route: String,

    /// Where `RedirectLogin` goes.
    pub login_path: String,

    /// Where `RedirectHome` goes.
    pub home_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mode: GuardMode::LocalOnly,
            policy: ExpiryPolicy::default(),
            verify_timeout: Duration::from_secs(10),
            login_route: LOGIN_ROUTE.to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}
