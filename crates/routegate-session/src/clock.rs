//! Sources of "now".
//!
//! Expiry is measured against wall-clock time because the markers are
//! persisted: a monotonic `Instant` means nothing after a restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use routegate_store::EpochMillis;

/// Tells the evaluator what time it is.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> EpochMillis;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        EpochMillis::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the guard.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: EpochMillis) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start.0)),
        }
    }

    pub fn set(&self, at: EpochMillis) {
        self.millis.store(at.0, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        // fetch_add wraps; saturate instead.
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |m| {
                Some(m.saturating_add(by))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EpochMillis {
        EpochMillis(self.millis.load(Ordering::SeqCst))
    }
}
