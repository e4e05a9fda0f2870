//! Clock behavior acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - The current period follows the network clock
//! - A failed clock read is an error unless the caller forces it
//! - Forced reads fall back according to the configured policy
//! - `now` degrades to the sentinel instead of failing

use super::common::{failing_registry, fixed_registry, MINUTE, ORIGIN_2024};
use period_common::config::ForcedFallback;
use period_core::{PeriodError, PeriodRegistry};
use period_timesource::{ClockSource, FailingTimeSource};
use std::sync::Arc;

#[test]
fn test_current_follows_network_clock() {
    let (registry, clock) = fixed_registry(ORIGIN_2024, ORIGIN_2024, MINUTE);
    assert_eq!(registry.current().unwrap().id(), 1);

    clock.advance(MINUTE - 1);
    assert_eq!(registry.current().unwrap().id(), 1);

    clock.advance(1);
    assert_eq!(registry.current().unwrap().id(), 2);

    clock.set(ORIGIN_2024 + 24 * 60 * MINUTE);
    assert_eq!(registry.now().id(), 24 * 60 + 1);
}

#[test]
fn test_clock_before_origin_is_an_error() {
    let (registry, _clock) = fixed_registry(ORIGIN_2024 - 1, ORIGIN_2024, MINUTE);
    assert!(matches!(
        registry.current(),
        Err(PeriodError::InvalidTimestamp(_))
    ));
    assert!(registry.now().is_sentinel());
}

#[test]
fn test_failed_clock_without_force() {
    let registry = failing_registry(ORIGIN_2024, MINUTE);
    assert!(!registry.force());

    match registry.current() {
        Err(PeriodError::InvalidTimestamp(msg)) => {
            assert!(msg.contains("timestamp can't be returned"), "{msg}");
        }
        other => panic!("expected invalid timestamp, got {other:?}"),
    }

    let sentinel = registry.now();
    assert!(sentinel.is_sentinel());
    assert_eq!(sentinel.bounds(), None);
}

#[test]
fn test_forced_read_falls_back_to_local_clock() {
    let registry = failing_registry(ORIGIN_2024, MINUTE);

    let period = registry.current_with_force(true).unwrap();
    assert!(period.id() > 1);

    registry.set_force(true);
    assert!(!registry.now().is_sentinel());
}

#[test]
fn test_forced_read_with_query_result_fallback() {
    let clock =
        ClockSource::new(Arc::new(FailingTimeSource)).with_fallback(ForcedFallback::QueryResult);
    let registry = PeriodRegistry::new(clock);

    // The zero time only maps to a period when the origin is the epoch
    registry.initialize(0, MINUTE, false).unwrap();
    assert_eq!(registry.current_with_force(true).unwrap().id(), 1);
}

#[test]
fn test_query_result_fallback_before_origin() {
    let clock =
        ClockSource::new(Arc::new(FailingTimeSource)).with_fallback(ForcedFallback::QueryResult);
    let registry = PeriodRegistry::new(clock);
    registry.initialize(ORIGIN_2024, MINUTE, false).unwrap();

    assert!(registry.current_with_force(true).is_err());
    registry.set_force(true);
    assert!(registry.now().is_sentinel());
}

#[test]
fn test_test_environment_toggle() {
    let registry = failing_registry(ORIGIN_2024, MINUTE);
    assert!(registry.current().is_err());

    assert!(registry.set_test_environment(true));
    assert!(registry.current().is_ok());

    assert!(!registry.set_test_environment(false));
    assert!(registry.current().is_err());
}
