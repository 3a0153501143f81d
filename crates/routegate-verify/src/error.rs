//! Error types for the verification layer.
//!
//! Note that [`Verifier::verify`](crate::Verifier::verify) itself never
//! returns an error: every failure is folded into a
//! [`VerifyOutcome`](crate::VerifyOutcome). These errors come from building
//! the client and from the login/logout calls.

/// Errors from the HTTP auth client.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The HTTP client couldn't be constructed (TLS backend, bad config).
    #[cfg(feature = "http")]
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server rejected request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The server answered 2xx but the body wasn't what we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
