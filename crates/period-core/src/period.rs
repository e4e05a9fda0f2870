//! Period values and their boundaries.

use crate::registry::PeriodRegistry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// A fixed-length, sequentially numbered time window.
///
/// IDs start at 1; ID 0 is the "no period" sentinel returned by
/// [`PeriodRegistry::now`] on failure. Boundaries are computed from the
/// registry configuration on first access and cached on this value, so an
/// origin reset does not affect boundaries that were already read.
///
/// Boundary arithmetic saturates at `u64::MAX`. A period whose start saturates
/// has an inverted range: it contains no timestamp and has no [`PeriodBounds`].
#[derive(Clone)]
pub struct Period {
    registry: PeriodRegistry,
    id: u64,
    start_millis: OnceLock<u64>,
    end_millis: OnceLock<u64>,
}

/// Serializable snapshot of a period's boundaries (inclusive, epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    /// Period ID.
    pub id: u64,
    /// First millisecond of the period.
    pub start_timestamp_millis: u64,
    /// Last millisecond of the period.
    pub end_timestamp_millis: u64,
}

impl Period {
    pub(crate) fn new(registry: PeriodRegistry, id: u64) -> Self {
        Self {
            registry,
            id,
            start_millis: OnceLock::new(),
            end_millis: OnceLock::new(),
        }
    }

    /// Period ID.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this is the ID 0 "no period" sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }

    /// First millisecond of the period: `origin + (id - 1) * span`.
    ///
    /// Returns 0 for the sentinel.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn start_timestamp_millis(&self) -> u64 {
        *self.start_millis.get_or_init(|| {
            if self.is_sentinel() {
                return 0;
            }
            let (origin, span) = self.registry.origin_and_span();
            // Genesis period is 1
            origin.saturating_add((self.id - 1).saturating_mul(span))
        })
    }

    /// Last millisecond of the period: `origin + id * span - 1`.
    ///
    /// Returns 0 for the sentinel.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn end_timestamp_millis(&self) -> u64 {
        *self.end_millis.get_or_init(|| {
            if self.is_sentinel() {
                return 0;
            }
            let (origin, span) = self.registry.origin_and_span();
            origin.saturating_add(self.id.saturating_mul(span)) - 1
        })
    }

    /// The following period, with nothing cached.
    ///
    /// Stepping past the last representable ID yields the sentinel.
    #[must_use]
    pub fn next(&self) -> Period {
        self.registry.period(self.id.checked_add(1).unwrap_or(0))
    }

    /// The preceding period, or `None` for period 1 and the sentinel.
    #[must_use]
    pub fn previous(&self) -> Option<Period> {
        (self.id > 1).then(|| self.registry.period(self.id - 1))
    }

    /// Whether `timestamp_millis` falls inside this period.
    ///
    /// Always false for the sentinel and for periods past the end of `u64` time.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    pub fn contains(&self, timestamp_millis: u64) -> bool {
        !self.is_sentinel()
            && (self.start_timestamp_millis()..=self.end_timestamp_millis())
                .contains(&timestamp_millis)
    }

    /// Boundary snapshot, or `None` for the sentinel and for periods whose
    /// saturated boundaries are inverted.
    ///
    /// # Panics
    ///
    /// Panics if the registry is not initialized.
    #[must_use]
    pub fn bounds(&self) -> Option<PeriodBounds> {
        if self.is_sentinel() {
            return None;
        }
        let start = self.start_timestamp_millis();
        let end = self.end_timestamp_millis();
        (start <= end).then_some(PeriodBounds {
            id: self.id,
            start_timestamp_millis: start,
            end_timestamp_millis: end,
        })
    }

    /// Registry this period was derived from.
    #[must_use]
    pub fn registry(&self) -> &PeriodRegistry {
        &self.registry
    }
}

impl fmt::Debug for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Period")
            .field("id", &self.id)
            .field("start_millis", &self.start_millis.get())
            .field("end_millis", &self.end_millis.get())
            .finish()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period #{}", self.id)
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Period {}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Period {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
