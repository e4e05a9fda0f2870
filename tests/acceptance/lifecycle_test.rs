//! Registry lifecycle acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Origin and span can be set exactly once, even under contention
//! - Handles cloned from a registry observe the same configuration
//! - An origin reset applies to fresh computations only

use super::common::{local_registry, MINUTE, ORIGIN_2024};
use period_core::{PeriodError, PeriodRegistry};
use period_timesource::ClockSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

#[test]
fn test_second_initialize_is_rejected_without_changes() {
    let registry = local_registry(ORIGIN_2024, MINUTE);

    let err = registry.initialize(0, 1, true).unwrap_err();
    assert!(err.is_already_initialized());
    assert_eq!(err.to_string(), "period already initialized");

    assert_eq!(registry.origin_timestamp(), ORIGIN_2024);
    assert_eq!(registry.span(), MINUTE);
    assert_eq!(registry.duration(), Duration::from_secs(60));
}

#[test]
fn test_zero_span_leaves_registry_uninitialized() {
    let registry = PeriodRegistry::new(ClockSource::local_only());
    assert_eq!(
        registry.initialize(ORIGIN_2024, 0, true).unwrap_err(),
        PeriodError::InvalidConfiguration("period span can't be null".into())
    );
    assert!(!registry.is_initialized());
    assert_eq!(registry.span(), 10_000);

    registry.initialize(ORIGIN_2024, MINUTE, true).unwrap();
    assert!(registry.is_initialized());
}

#[test]
fn test_contended_initialize_has_one_winner() {
    const THREADS: usize = 16;

    let registry = PeriodRegistry::new(ClockSource::local_only());
    let barrier = Barrier::new(THREADS);
    let winners = AtomicUsize::new(0);

    thread::scope(|s| {
        for i in 0..THREADS {
            let registry = registry.clone();
            let barrier = &barrier;
            let winners = &winners;
            s.spawn(move || {
                barrier.wait();
                let span = 1_000 * (i as u64 + 1);
                match registry.initialize(0, span, true) {
                    Ok(()) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => assert!(e.is_already_initialized()),
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    let span = registry.span();
    assert_eq!(span % 1_000, 0);
    assert_eq!(registry.get(span).unwrap().id(), 2);
}

#[test]
fn test_clones_share_configuration() {
    let registry = PeriodRegistry::new(ClockSource::local_only());
    let handle = registry.clone();
    registry.initialize(ORIGIN_2024, MINUTE, true).unwrap();

    assert!(handle.is_initialized());
    assert_eq!(handle.get(ORIGIN_2024 + MINUTE).unwrap().id(), 2);

    handle.reset_origin(0);
    assert_eq!(registry.origin_timestamp(), 0);
}

#[test]
fn test_reset_origin_applies_to_fresh_periods_only() {
    let registry = local_registry(ORIGIN_2024, MINUTE);
    let before = registry.get(ORIGIN_2024).unwrap();
    let start = before.start_timestamp_millis();
    let end = before.end_timestamp_millis();

    registry.reset_origin(ORIGIN_2024 + MINUTE);

    assert_eq!(before.start_timestamp_millis(), start);
    assert_eq!(before.end_timestamp_millis(), end);
    assert_eq!(
        registry.period(1).start_timestamp_millis(),
        ORIGIN_2024 + MINUTE
    );
    assert!(registry.get(ORIGIN_2024).is_err());
}

#[test]
fn test_reset_origin_before_initialize_is_staged() {
    let registry = PeriodRegistry::new(ClockSource::local_only());
    registry.reset_origin(ORIGIN_2024);
    assert_eq!(registry.origin_timestamp(), ORIGIN_2024);
    assert!(!registry.is_initialized());

    registry.initialize(0, MINUTE, true).unwrap();
    assert_eq!(registry.origin_timestamp(), 0);
    assert_eq!(registry.get(MINUTE).unwrap().id(), 2);
}

#[test]
fn test_periods_keep_their_registry_alive() {
    let period = {
        let registry = local_registry(0, 10);
        registry.period(4)
    };
    assert_eq!(period.start_timestamp_millis(), 30);
    assert_eq!(period.registry().span(), 10);
}

#[test]
#[should_panic(expected = "period registry wasn't initialized")]
fn test_uninitialized_query_panics() {
    let registry = PeriodRegistry::new(ClockSource::local_only());
    let _ = registry.get(0);
}
