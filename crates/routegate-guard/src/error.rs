//! Error types for the guard layer.
//!
//! These only come up while setting a guard up. Once running, `navigate`
//! never fails: every problem becomes a [`Decision`](crate::Decision).

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A route pattern couldn't be parsed.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two routes share a name.
    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),

    /// Remote verification was requested but no verifier was supplied.
    #[error("remote verification mode requires a verifier")]
    MissingVerifier,
}
