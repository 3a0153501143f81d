//! Remote token verification for Routegate.
//!
//! The local expiry checks only prove that the client still *believes* in
//! its token. The backend may have forgotten it (restart, logout elsewhere).
//! This crate provides the one round-trip that asks:
//!
//! - **[`Verifier`] trait** — "is this token still accepted?", answered with
//!   a [`VerifyOutcome`]. The guard is written against the trait, so tests
//!   plug in scripted verifiers.
//! - **[`AuthClient`]** (feature `http`, on by default) — the HTTP
//!   implementation against the dashboard backend, which also performs the
//!   login and logout calls that bracket a session.
//!
//! # Feature Flags
//!
//! - `http` (default) — [`AuthClient`] via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;
mod verifier;

pub use error::VerifyError;
#[cfg(feature = "http")]
pub use http::{AuthClient, LOGIN_PATH, LOGOUT_PATH, VERIFY_PATH};
pub use verifier::{Verifier, VerifierConfig, VerifyOutcome};
