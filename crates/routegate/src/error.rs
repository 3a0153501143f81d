//! Unified error type for Routegate.

use routegate_guard::GuardError;
use routegate_session::SessionError;
use routegate_store::StoreError;
use routegate_verify::VerifyError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `routegate` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoutegateError {
    /// The session store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session could not be started, kept, or ended.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A call to the backend's auth endpoints failed.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// The guard could not be built from its configuration.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// A setting could not be parsed.
    #[error("invalid setting {name}: {reason}")]
    Config { name: &'static str, reason: String },
}
