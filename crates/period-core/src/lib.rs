//! Period numbering core.
//!
//! Maps epoch-millisecond timestamps to sequential, fixed-length periods and
//! back. A [`PeriodRegistry`] holds the set-once origin and span; [`Period`]
//! values compute their own boundaries on demand.
//!
//! ```
//! use period_core::PeriodRegistry;
//! use period_timesource::ClockSource;
//!
//! let registry = PeriodRegistry::new(ClockSource::local_only());
//! registry.initialize(0, 10_000, true).unwrap();
//!
//! let p = registry.get(25_000).unwrap();
//! assert_eq!(p.id(), 3);
//! assert_eq!(p.start_timestamp_millis(), 20_000);
//! assert_eq!(p.end_timestamp_millis(), 29_999);
//! assert_eq!(p.next().start_timestamp_millis(), 30_000);
//! ```

pub mod period;
pub mod registry;

pub use period::{Period, PeriodBounds};
pub use registry::PeriodRegistry;

pub use period_common::error::{PeriodError, PeriodResult};
