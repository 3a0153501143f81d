//! Persisted session markers for Routegate.
//!
//! This crate is the bottom of the stack. It knows how to keep the four
//! session markers (token, issue time, last activity, cached user) in a
//! string key/value medium and how to hand them back as one unit:
//!
//! 1. **Storage media** — [`KeyValueStorage`] with an in-memory
//!    ([`MemoryStorage`]) and an on-disk ([`JsonFileStorage`]) backend
//! 2. **Session store** — [`SessionStore`], the interface the evaluator and
//!    guard are written against, implemented by [`KvSessionStore`]
//! 3. **Types** — [`SessionRecord`], [`EpochMillis`], [`CachedUser`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard Layer          ← decides navigations
//!     ↕
//! Session Layer        ← evaluates expiry, refreshes last activity
//!     ↕
//! Store Layer (this crate)  ← reads/writes/clears the markers atomically
//! ```
//!
//! The store never interprets timestamps. It returns them as
//! [`StoredTimestamp`] so the session layer decides what a malformed value
//! means.

mod error;
mod storage;
mod store;
mod types;

pub use error::StoreError;
pub use storage::{JsonFileStorage, KeyValueStorage, MemoryStorage};
pub use store::{KvSessionStore, SessionStore, keys};
pub use types::{CachedUser, EpochMillis, SessionRecord, StoredTimestamp};
