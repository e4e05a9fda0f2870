//! Clock selection and forced fallback.
//!
//! [`ClockSource`] is what the period registry reads. In a test environment
//! it answers from the local clock and never fails. Otherwise it asks the
//! network source, and on failure either reports an invalid timestamp or,
//! when the caller forces the read, applies the configured [`ForcedFallback`].

use crate::local::LocalClock;
use crate::sntp::SntpClient;
use crate::TimeSource;
use period_common::config::{ForcedFallback, TimeSourceConfig};
use period_common::error::{PeriodError, PeriodResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Network-backed clock with a local test mode.
#[derive(Debug)]
pub struct ClockSource {
    network: Arc<dyn TimeSource>,
    local: LocalClock,
    test_environment: AtomicBool,
    fallback: ForcedFallback,
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::from_config(&TimeSourceConfig::default())
    }
}

impl ClockSource {
    /// Create a clock around the given network source.
    pub fn new(network: Arc<dyn TimeSource>) -> Self {
        Self {
            network,
            local: LocalClock::new(),
            test_environment: AtomicBool::new(false),
            fallback: ForcedFallback::default(),
        }
    }

    /// Create an SNTP-backed clock from the `time_source` configuration section.
    #[must_use]
    pub fn from_config(config: &TimeSourceConfig) -> Self {
        Self::new(Arc::new(SntpClient::from_config(config))).with_fallback(config.fallback)
    }

    /// Create a clock already in test mode.
    #[must_use]
    pub fn local_only() -> Self {
        let clock = Self::default();
        clock.set_test_environment(true);
        clock
    }

    /// Set the forced fallback policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: ForcedFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Configured forced fallback policy.
    #[must_use]
    pub fn fallback(&self) -> ForcedFallback {
        self.fallback
    }

    /// Read the current time in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Outside the test environment, returns [`PeriodError::InvalidTimestamp`]
    /// when the network source fails and `force` is false.
    pub fn current_millis(&self, force: bool) -> PeriodResult<u64> {
        if self.is_test_environment() {
            return Ok(self.local.now_millis());
        }

        match self.network.current_millis() {
            Ok(millis) => {
                trace!(millis, "Network time read");
                Ok(millis)
            }
            Err(e) if force => {
                let millis = match self.fallback {
                    ForcedFallback::LocalClock => self.local.now_millis(),
                    ForcedFallback::QueryResult => 0,
                };
                warn!(
                    error = %e,
                    fallback = ?self.fallback,
                    millis,
                    "Network time query failed, forcing fallback"
                );
                Ok(millis)
            }
            Err(e) => Err(PeriodError::invalid_timestamp(format!(
                "time server query failed: timestamp can't be returned ({e})"
            ))),
        }
    }

    /// Toggle test mode, returning the new state.
    pub fn set_test_environment(&self, is_test: bool) -> bool {
        self.test_environment.store(is_test, Ordering::Release);
        self.is_test_environment()
    }

    /// Whether the clock reads local time only.
    pub fn is_test_environment(&self) -> bool {
        self.test_environment.load(Ordering::Acquire)
    }
}
