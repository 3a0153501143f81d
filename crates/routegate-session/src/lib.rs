//! Session validity for Routegate.
//!
//! This crate decides whether the stored session may still be used:
//!
//! 1. **Policy** — how old a token may get and how long it may sit idle
//!    ([`ExpiryPolicy`], 30 and 7 days by default)
//! 2. **Evaluation** — checking a stored session against the policy at a
//!    given instant, refreshing or clearing it ([`evaluate`], [`is_valid`])
//! 3. **Lifecycle bookkeeping** — recording a fresh login and forgetting
//!    it on logout ([`begin_session`], [`end_session`])
//!
//! Time comes from a [`Clock`], so callers (and tests) control "now".
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard Layer (above)   ← asks "is this session usable?" on every navigation
//!     ↕
//! Session Layer (this crate)  ← applies the expiry policy, mutates markers
//!     ↕
//! Store Layer (below)   ← persists the markers
//! ```

mod clock;
mod error;
mod evaluator;
mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use evaluator::{begin_session, end_session, evaluate, is_valid};
pub use policy::{DAY_MS, ExpiryPolicy};
