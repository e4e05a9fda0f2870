//! Timeline tiling acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Consecutive periods share no millisecond and leave no gap
//! - Every timestamp at or after the origin maps into exactly one period
//! - Period IDs grow by one per span

use super::common::{local_registry, MINUTE, ORIGIN_2024};
use period_common::error::PeriodError;
use period_common::time::parse_timestamp;

#[test]
fn test_first_hour_of_2024_in_minutes() {
    let registry = local_registry(ORIGIN_2024, MINUTE);

    let first = registry.get(ORIGIN_2024).unwrap();
    assert_eq!(first.id(), 1);
    assert_eq!(first.start_timestamp_millis(), ORIGIN_2024);
    assert_eq!(first.end_timestamp_millis(), ORIGIN_2024 + MINUTE - 1);

    let ts = parse_timestamp("2024-01-01T00:59:59.999Z").unwrap();
    let last = registry.get(ts).unwrap();
    assert_eq!(last.id(), 60);
    assert_eq!(last.end_timestamp_millis(), ts);
    assert_eq!(last.next().start_timestamp_millis(), ts + 1);
}

#[test]
fn test_walk_tiles_without_gaps() {
    let registry = local_registry(ORIGIN_2024, 7);
    let mut period = registry.get(ORIGIN_2024).unwrap();

    for _ in 0..10_000 {
        let next = period.next();
        assert_eq!(next.id(), period.id() + 1);
        assert_eq!(period.end_timestamp_millis() + 1, next.start_timestamp_millis());
        assert_eq!(
            next.end_timestamp_millis() - next.start_timestamp_millis() + 1,
            7
        );
        period = next;
    }
}

#[test]
fn test_every_millisecond_lands_in_its_period() {
    let registry = local_registry(1_000, 250);
    for ts in 1_000..3_000 {
        let period = registry.get(ts).unwrap();
        assert_eq!(period.id(), (ts - 1_000) / 250 + 1);
        assert!(period.contains(ts));
        assert!(period.start_timestamp_millis() <= ts);
        assert!(ts <= period.end_timestamp_millis());
    }
}

#[test]
fn test_timestamps_before_origin_are_rejected() {
    let registry = local_registry(ORIGIN_2024, MINUTE);
    for ts in [0, ORIGIN_2024 - MINUTE, ORIGIN_2024 - 1] {
        assert_eq!(
            registry.get(ts).unwrap_err(),
            PeriodError::InvalidTimestamp("timestamp is lower than begin of period".into())
        );
    }
}

#[test]
fn test_previous_walks_back_to_genesis() {
    let registry = local_registry(0, 10);
    let mut period = registry.get(95).unwrap();
    assert_eq!(period.id(), 10);

    let mut steps = 0;
    while let Some(previous) = period.previous() {
        assert_eq!(previous.end_timestamp_millis() + 1, period.start_timestamp_millis());
        period = previous;
        steps += 1;
    }
    assert_eq!(steps, 9);
    assert_eq!(period.id(), 1);
    assert_eq!(period.start_timestamp_millis(), 0);
}

#[test]
fn test_sorted_periods_dedupe_by_id() {
    let registry = local_registry(0, 100);
    let mut periods: Vec<_> = [250, 10, 299, 200, 0, 99]
        .into_iter()
        .map(|ts| registry.get(ts).unwrap())
        .collect();
    periods.sort();
    periods.dedup();

    let ids: Vec<_> = periods.iter().map(period_core::Period::id).collect();
    assert_eq!(ids, vec![1, 3]);
}
