//! What the guard decides, and what the user is told.

use std::fmt;

use routegate_session::SessionError;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// A user-visible message shown alongside a forced redirect to login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// There was no session to begin with.
    PleaseLogIn,
    /// The session expired locally or the server rejected it.
    SessionExpired,
    /// The server couldn't be asked. Distinct from a rejection so the user
    /// knows to check their connection.
    VerificationFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PleaseLogIn => "please log in first",
            Self::SessionExpired => "session expired, please log in again",
            Self::VerificationFailed => "verification failed, please log in again",
        }
    }

    /// The notice that goes with a session failure.
    pub fn for_error(err: &SessionError) -> Self {
        match err {
            SessionError::MissingSession | SessionError::Store(_) => Self::PleaseLogIn,
            SessionError::ExpiredByAge { .. }
            | SessionError::ExpiredByInactivity { .. }
            | SessionError::MalformedTimestamp { .. }
            | SessionError::TimestampInFuture { .. }
            | SessionError::RemoteRejected { .. } => Self::SessionExpired,
            SessionError::TransportFailure(_) => Self::VerificationFailed,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The one terminal outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the requested route.
    Allowed,

    /// Go to the login page, optionally telling the user why.
    RedirectLogin { notice: Option<Notice> },

    /// Go to the home page (already logged in, or not allowed here).
    RedirectHome,

    /// A newer navigation started while this one waited on the server.
    /// Nothing was changed; the newer navigation decides.
    Superseded,
}

impl Decision {
    pub fn login(notice: Notice) -> Self {
        Self::RedirectLogin {
            notice: Some(notice),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::RedirectLogin { notice } => *notice,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// NavState
// ---------------------------------------------------------------------------

/// Lifecycle of one navigation attempt.
///
/// ```text
///              ┌──→ Allowed
///              ├──→ RedirectLogin
///  Evaluating ─┼──→ RedirectHome
///              └──→ Superseded
/// ```
///
/// Evaluating is the only non-terminal state. It lasts as long as the
/// remote verification (if any) is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Evaluating,
    Decided(Decision),
}

impl NavState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Decided(_))
    }

    /// Only `Evaluating → Decided(_)` is a valid transition.
    pub fn can_transition_to(&self, target: &NavState) -> bool {
        matches!((self, target), (Self::Evaluating, Self::Decided(_)))
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluating => write!(f, "Evaluating"),
            Self::Decided(Decision::Allowed) => write!(f, "Allowed"),
            Self::Decided(Decision::RedirectLogin { .. }) => write!(f, "RedirectLogin"),
            Self::Decided(Decision::RedirectHome) => write!(f, "RedirectHome"),
            Self::Decided(Decision::Superseded) => write!(f, "Superseded"),
        }
    }
}

/// A navigation attempt and where it stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Monotonically increasing per guard, starting at 1.
    pub seq: u64,
    pub path: String,
    pub state: NavState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::PleaseLogIn.to_string(), "please log in first");
        assert_eq!(
            Notice::SessionExpired.to_string(),
            "session expired, please log in again"
        );
        assert_eq!(
            Notice::VerificationFailed.to_string(),
            "verification failed, please log in again"
        );
    }

    #[test]
    fn test_for_error_maps_failures() {
        assert_eq!(
            Notice::for_error(&SessionError::MissingSession),
            Notice::PleaseLogIn
        );
        assert_eq!(
            Notice::for_error(&SessionError::RemoteRejected { status: 401 }),
            Notice::SessionExpired
        );
        assert_eq!(
            Notice::for_error(&SessionError::MalformedTimestamp {
                field: "issued_at",
                value: "x".into()
            }),
            Notice::SessionExpired
        );
        assert_eq!(
            Notice::for_error(&SessionError::TransportFailure("refused".into())),
            Notice::VerificationFailed
        );
    }

    #[test]
    fn test_decision_notice_only_on_login_redirect() {
        assert_eq!(
            Decision::login(Notice::SessionExpired).notice(),
            Some(Notice::SessionExpired)
        );
        assert_eq!(Decision::RedirectHome.notice(), None);
        assert!(Decision::Allowed.is_allowed());
    }

    #[test]
    fn test_nav_state_transitions() {
        let decided = NavState::Decided(Decision::Allowed);
        assert!(NavState::Evaluating.can_transition_to(&decided));
        assert!(!decided.can_transition_to(&NavState::Evaluating));
        assert!(!decided.can_transition_to(&NavState::Decided(Decision::RedirectHome)));
        assert!(decided.is_terminal());
        assert!(!NavState::Evaluating.is_terminal());
    }
}
