//! Simulated time sources for testing without network access.

use crate::{TimeSource, TimeSourceError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Time source returning a settable instant.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    millis: AtomicU64,
}

impl FixedTimeSource {
    /// Create a source frozen at `millis`.
    #[must_use]
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the frozen instant.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Release);
    }

    /// Advance the frozen instant by `delta` milliseconds, returning the new value.
    pub fn advance(&self, delta: u64) -> u64 {
        self.millis
            .fetch_add(delta, Ordering::AcqRel)
            .saturating_add(delta)
    }
}

impl TimeSource for FixedTimeSource {
    fn current_millis(&self) -> Result<u64, TimeSourceError> {
        Ok(self.millis.load(Ordering::Acquire))
    }
}

/// Time source that always fails, standing in for an unreachable server.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTimeSource;

impl TimeSource for FailingTimeSource {
    fn current_millis(&self) -> Result<u64, TimeSourceError> {
        Err(TimeSourceError::Unavailable("simulated outage".into()))
    }
}
