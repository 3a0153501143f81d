//! Navigation guard for Routegate.
//!
//! The guard sits in front of the router. For each navigation it resolves
//! the target route, consults the session (and, in remote mode, the
//! backend), and returns exactly one [`Decision`]:
//!
//! - **Routes** ([`RouteTable`], [`Route`], [`RouteMeta`]) — which paths
//!   need a session and which need an admin
//! - **Guard** ([`RouteGuard`]) — the decision procedure, with sequence
//!   numbers so a late verification can't act on a navigation the user
//!   already left
//! - **Outcomes** ([`Decision`], [`Notice`], [`NavState`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Router / UI (above)        ← follows the decision
//!     ↕
//! Guard Layer (this crate)   ← one decision per navigation
//!     ↕                 ↘
//! Session Layer             Verify Layer
//! ```

mod config;
mod decision;
mod error;
mod guard;
mod route;

pub use config::{GuardConfig, GuardMode};
pub use decision::{Decision, NavState, Navigation, Notice};
pub use error::GuardError;
pub use guard::{NoVerifier, RouteGuard, RouteGuardBuilder};
pub use route::{LOGIN_ROUTE, Route, RouteMeta, RouteTable, Target};
