//! The verification seam: trait, outcome, and configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the backend said about a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// 2xx: the token is still known to the backend.
    Accepted,

    /// Any other status: the backend does not accept the token.
    Rejected { status: u16 },

    /// No usable answer (connect error, timeout, broken response).
    NetworkError(String),
}

impl VerifyOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected { status } => write!(f, "rejected ({status})"),
            Self::NetworkError(e) => write!(f, "network error: {e}"),
        }
    }
}

/// Asks the backend whether a token is still accepted.
///
/// # Trait bounds
///
/// - `Send + Sync` → one verifier is shared by every navigation, possibly
///   on different runtime threads.
/// - `'static` → it lives as long as the guard that owns it.
///
/// # Example
///
/// ```rust
/// use routegate_verify::{Verifier, VerifyOutcome};
///
/// /// Accepts exactly one token. Handy in tests.
/// struct OneToken(&'static str);
///
/// impl Verifier for OneToken {
///     async fn verify(&self, token: &str) -> VerifyOutcome {
///         if token == self.0 {
///             VerifyOutcome::Accepted
///         } else {
///             VerifyOutcome::Rejected { status: 401 }
///         }
///     }
/// }
/// ```
pub trait Verifier: Send + Sync + 'static {
    /// Performs one verification round-trip for `token`.
    ///
    /// Must not fail: transport problems are reported as
    /// [`VerifyOutcome::NetworkError`].
    fn verify(&self, token: &str) -> impl std::future::Future<Output = VerifyOutcome> + Send;
}

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Scheme, host, and port of the backend, e.g. `http://127.0.0.1:8001`.
    /// A trailing slash is ignored.
    pub base_url: String,

    /// Upper bound on one request, connect included.
    ///
    /// Default: 10 seconds.
    pub timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl VerifierConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
