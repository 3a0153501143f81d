//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes. Safe to call more than once.
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
