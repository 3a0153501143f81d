//! Error types for the session layer.

use routegate_store::StoreError;

/// Why a stored session can't be used.
///
/// Every variant is a reason to send the user back to the login page. None
/// of them is fatal: the guard turns each one into a navigation decision.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No token is stored (or one of the required markers is missing).
    #[error("no session")]
    MissingSession,

    /// The token is older than the policy's maximum age.
    #[error("session expired by age ({age_ms} ms > {max_ms} ms)")]
    ExpiredByAge { age_ms: u64, max_ms: u64 },

    /// The session sat unused longer than the policy allows.
    #[error("session expired by inactivity ({idle_ms} ms > {max_ms} ms)")]
    ExpiredByInactivity { idle_ms: u64, max_ms: u64 },

    /// A stored timestamp isn't an integer. Handled like an age expiry.
    #[error("malformed {field} timestamp {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },

    /// A stored timestamp lies after the current time (clock moved back,
    /// or the markers were edited). Handled like an age expiry.
    #[error("{field} timestamp {at} is later than now ({now})")]
    TimestampInFuture {
        field: &'static str,
        at: u64,
        now: u64,
    },

    /// The backend answered the verification request with a non-2xx status.
    #[error("token rejected by server (status {status})")]
    RemoteRejected { status: u16 },

    /// The verification request never got an answer (connect failure,
    /// timeout, broken response).
    #[error("token verification failed: {0}")]
    TransportFailure(String),

    /// Reading or writing the session markers failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Returns `true` for the verdicts produced by the local expiry policy.
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            Self::ExpiredByAge { .. }
                | Self::ExpiredByInactivity { .. }
                | Self::MalformedTimestamp { .. }
                | Self::TimestampInFuture { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_covers_local_verdicts() {
        assert!(SessionError::ExpiredByAge { age_ms: 2, max_ms: 1 }.is_expired());
        assert!(SessionError::ExpiredByInactivity { idle_ms: 2, max_ms: 1 }.is_expired());
        assert!(
            SessionError::MalformedTimestamp {
                field: "issued_at",
                value: "x".into()
            }
            .is_expired()
        );
        assert!(
            SessionError::TimestampInFuture {
                field: "last_activity",
                at: 2,
                now: 1
            }
            .is_expired()
        );
        assert!(!SessionError::MissingSession.is_expired());
        assert!(!SessionError::RemoteRejected { status: 401 }.is_expired());
    }

    #[test]
    fn test_display_mentions_status() {
        let err = SessionError::RemoteRejected { status: 401 };
        assert!(err.to_string().contains("401"));
    }
}
