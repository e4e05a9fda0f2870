//! Set-once period configuration and period derivation.
//!
//! A [`PeriodRegistry`] is a cheaply cloneable handle. All clones share one
//! configuration, which is published atomically by the first successful
//! [`PeriodRegistry::initialize`] call and is immutable afterwards, except for
//! the explicit [`PeriodRegistry::reset_origin`] escape hatch.
//!
//! Querying an uninitialized registry is a programming error and panics.
//! Resetting the origin is not a query: before initialization it only stages
//! a value that [`PeriodRegistry::initialize`] then overwrites.

use crate::period::Period;
use period_common::config::PeriodConfig;
use period_common::error::{PeriodError, PeriodResult};
use period_common::time::{span_duration, DEFAULT_SPAN_MILLIS};
use period_timesource::ClockSource;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

const UNINITIALIZED: &str = "period registry wasn't initialized";

/// Configuration published by the first successful initialization.
#[derive(Debug)]
struct Settings {
    /// Period length in milliseconds, never zero.
    span: u64,
}

#[derive(Debug)]
struct RegistryInner {
    settings: OnceLock<Settings>,
    /// Start of period 1 (epoch milliseconds). Written by the winning
    /// `initialize` before `settings` is published, and by `reset_origin`.
    origin_millis: AtomicU64,
    clock: ClockSource,
    force: AtomicBool,
}

/// Shared handle to a period configuration and its clock.
#[derive(Debug, Clone)]
pub struct PeriodRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for PeriodRegistry {
    fn default() -> Self {
        Self::new(ClockSource::default())
    }
}

impl PeriodRegistry {
    /// Create an uninitialized registry reading time from `clock`.
    #[must_use]
    pub fn new(clock: ClockSource) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                settings: OnceLock::new(),
                origin_millis: AtomicU64::new(0),
                clock,
                force: AtomicBool::new(false),
            }),
        }
    }

    /// Create and initialize a registry from configuration.
    ///
    /// The clock is built from the `time_source` section and the configured
    /// `force` flag becomes the default policy of [`PeriodRegistry::current`].
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidConfiguration`] for a zero span.
    pub fn from_config(config: &PeriodConfig) -> PeriodResult<Self> {
        let registry = Self::new(ClockSource::from_config(&config.time_source));
        registry.initialize(
            config.origin_timestamp,
            config.span,
            config.test_environment,
        )?;
        registry.set_force(config.force);
        Ok(registry)
    }

    /// Configure origin and span exactly once.
    ///
    /// `is_test` switches the clock to local-clock-only mode; passing `false`
    /// leaves the clock mode unchanged.
    ///
    /// # Errors
    ///
    /// - [`PeriodError::AlreadyInitialized`] if any earlier call succeeded; the
    ///   existing configuration is untouched.
    /// - [`PeriodError::InvalidConfiguration`] if `span` is zero.
    pub fn initialize(&self, origin_millis: u64, span: u64, is_test: bool) -> PeriodResult<()> {
        if self.is_initialized() {
            return Err(PeriodError::AlreadyInitialized);
        }
        if span == 0 {
            return Err(PeriodError::InvalidConfiguration(
                "period span can't be null".into(),
            ));
        }

        let mut published = false;
        self.inner.settings.get_or_init(|| {
            published = true;
            self.inner
                .origin_millis
                .store(origin_millis, Ordering::Release);
            Settings { span }
        });
        if !published {
            // Lost a race against a concurrent initialize
            return Err(PeriodError::AlreadyInitialized);
        }

        if is_test {
            self.inner.clock.set_test_environment(true);
        }
        info!(
            origin_millis,
            span,
            test_environment = self.is_test_environment(),
            "Period registry initialized"
        );
        Ok(())
    }

    /// Whether [`PeriodRegistry::initialize`] has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.settings.get().is_some()
    }

    fn settings(&self) -> &Settings {
        self.inner.settings.get().expect(UNINITIALIZED)
    }

    /// Overwrite the origin timestamp.
    ///
    /// Use with caution: boundaries already cached on existing [`Period`] values
    /// keep the old origin, while every fresh computation uses the new one.
    /// Intended for tests and recovery only, never concurrently with queries.
    ///
    /// Never fails. On an uninitialized registry the value is only staged:
    /// the origin passed to [`PeriodRegistry::initialize`] replaces it.
    pub fn reset_origin(&self, new_origin_millis: u64) {
        let previous = self
            .inner
            .origin_millis
            .swap(new_origin_millis, Ordering::AcqRel);
        warn!(
            previous_origin = previous,
            new_origin = new_origin_millis,
            "Period origin reset; previously computed boundaries are stale"
        );
    }

    /// Current origin timestamp (epoch milliseconds).
    ///
    /// Before initialization this is 0 or the last staged reset.
    #[must_use]
    pub fn origin_timestamp(&self) -> u64 {
        self.inner.origin_millis.load(Ordering::Acquire)
    }

    /// Configured span; reports the 10 s default before initialization.
    #[must_use]
    pub fn span(&self) -> u64 {
        self.inner
            .settings
            .get()
            .map_or(DEFAULT_SPAN_MILLIS, |s| s.span)
    }

    /// Period length as a [`Duration`].
    ///
    /// The span is scaled by one million and read as nanoseconds, so the
    /// duration is `span` milliseconds long.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    #[must_use]
    pub fn duration(&self) -> Duration {
        span_duration(self.settings().span)
    }

    /// Period containing `timestamp_millis`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::InvalidTimestamp`] if the timestamp precedes the
    /// origin, or if its period ID would not fit in a `u64`.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn get(&self, timestamp_millis: u64) -> PeriodResult<Period> {
        let (origin, span) = self.origin_and_span();
        if timestamp_millis < origin {
            return Err(PeriodError::invalid_timestamp(
                "timestamp is lower than begin of period",
            ));
        }
        let id = ((timestamp_millis - origin) / span)
            .checked_add(1)
            .ok_or_else(|| {
                PeriodError::invalid_timestamp("timestamp is beyond the last representable period")
            })?;
        Ok(self.period(id))
    }

    /// Period containing the current time, read with the default force policy.
    ///
    /// # Errors
    ///
    /// Propagates clock failures and [`PeriodRegistry::get`] errors unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn current(&self) -> PeriodResult<Period> {
        self.current_with_force(self.force())
    }

    /// Period containing the current time, overriding the force policy.
    ///
    /// # Errors
    ///
    /// Propagates clock failures and [`PeriodRegistry::get`] errors unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn current_with_force(&self, force: bool) -> PeriodResult<Period> {
        // Fail on misuse before touching the network
        let _ = self.settings();
        let now = self.inner.clock.current_millis(force)?;
        self.get(now)
    }

    /// Best-effort current period: the sentinel (ID 0) when [`PeriodRegistry::current`] fails.
    ///
    /// Callers that need to see the error use `current` instead.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    #[must_use]
    pub fn now(&self) -> Period {
        self.current().unwrap_or_else(|e| {
            debug!(error = %e, "Current period unavailable, returning sentinel");
            self.period(0)
        })
    }

    /// Period with an explicit ID. ID 0 is the "no period" sentinel.
    #[must_use]
    pub fn period(&self, id: u64) -> Period {
        Period::new(self.clone(), id)
    }

    /// Boundary arithmetic shared with [`Period`]: `(origin, span)`.
    pub(crate) fn origin_and_span(&self) -> (u64, u64) {
        let span = self.settings().span;
        (self.origin_timestamp(), span)
    }

    /// Default force policy of [`PeriodRegistry::current`].
    #[must_use]
    pub fn force(&self) -> bool {
        self.inner.force.load(Ordering::Acquire)
    }

    /// Change the default force policy of [`PeriodRegistry::current`].
    pub fn set_force(&self, force: bool) {
        self.inner.force.store(force, Ordering::Release);
    }

    /// Toggle the clock's test mode, returning the new state.
    pub fn set_test_environment(&self, is_test: bool) -> bool {
        self.inner.clock.set_test_environment(is_test)
    }

    /// Whether the clock reads local time only.
    #[must_use]
    pub fn is_test_environment(&self) -> bool {
        self.inner.clock.is_test_environment()
    }

    /// The clock this registry reads.
    #[must_use]
    pub fn clock(&self) -> &ClockSource {
        &self.inner.clock
    }
}
