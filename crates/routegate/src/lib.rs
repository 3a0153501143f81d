//! # Routegate
//!
//! Session-validity route guard for dashboard front ends.
//!
//! Every navigation is checked against a locally persisted session (token,
//! issue time, last activity, cached user). Sessions expire 30 days after
//! issuance or after 7 days without use, whichever comes first. Optionally
//! the token is also confirmed with the backend before the page opens.
//! Anything ambiguous fails closed: the session is cleared and the visitor
//! is sent to the login page.
//!
//! The work is split across layers, each its own crate:
//!
//! ```text
//! routegate-store    persisted session markers (memory or JSON file)
//! routegate-session  expiry policy, clock, validity evaluation
//! routegate-verify   remote verification and the login/logout client
//! routegate-guard    route table and the per-navigation decision
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use routegate::prelude::*;
//!
//! # async fn run() -> Result<(), RoutegateError> {
//! routegate::init_tracing();
//!
//! let settings = Settings::from_env()?;
//! let client = settings.auth_client()?;
//! let guard = settings.build_guard(client)?;
//!
//! match guard.navigate("/charts/dev-7").await {
//!     Decision::Allowed => { /* render */ }
//!     other => println!("go to {:?}", guard.redirect_path(&other)),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod logging;
mod settings;

pub use error::RoutegateError;
pub use logging::{DEFAULT_FILTER, init_tracing};
pub use settings::{API_VAR, FileGuard, MODE_VAR, STORE_VAR, Settings, TIMEOUT_VAR};

pub use routegate_guard as guard;
pub use routegate_session as session;
pub use routegate_store as store;
pub use routegate_verify as verify;

/// Commonly used types, for `use routegate::prelude::*`.
pub mod prelude {
    pub use crate::{RoutegateError, Settings};
    pub use routegate_guard::{
        Decision, GuardConfig, GuardMode, NavState, Navigation, Notice, Route, RouteGuard,
        RouteMeta, RouteTable,
    };
    pub use routegate_session::{
        Clock, ExpiryPolicy, SystemClock, begin_session, end_session, evaluate, is_valid,
    };
    pub use routegate_store::{
        CachedUser, JsonFileStorage, KvSessionStore, MemoryStorage, SessionRecord, SessionStore,
    };
    pub use routegate_verify::{AuthClient, Verifier, VerifierConfig, VerifyOutcome};
}
