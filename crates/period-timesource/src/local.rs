//! Local wall clock.

use crate::{TimeSource, TimeSourceError};
use period_common::time::unix_now_millis;
use std::sync::atomic::{AtomicU64, Ordering};

/// Local wall clock in epoch milliseconds.
///
/// Readings are strictly increasing per instance: when the wall clock repeats a
/// millisecond (or steps backwards) the previous reading plus one is returned.
#[derive(Debug, Default)]
pub struct LocalClock {
    last_millis: AtomicU64,
}

impl LocalClock {
    /// Create a new local clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clock. Never fails.
    pub fn now_millis(&self) -> u64 {
        let wall = unix_now_millis();
        let mut prev = self.last_millis.load(Ordering::Acquire);
        loop {
            let next = wall.max(prev.saturating_add(1));
            match self.last_millis.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Last value handed out, or 0 if the clock was never read.
    pub fn last_millis(&self) -> u64 {
        self.last_millis.load(Ordering::Acquire)
    }
}

impl TimeSource for LocalClock {
    fn current_millis(&self) -> Result<u64, TimeSourceError> {
        Ok(self.now_millis())
    }
}
