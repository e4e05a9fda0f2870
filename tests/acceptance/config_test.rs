//! Configuration-driven acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Registries built from TOML files honor origin, span and test mode
//! - Omitted keys fall back to documented defaults
//! - Invalid files are reported, never silently replaced by defaults

use super::common::{config_from_str, write_config, MINUTE, ORIGIN_2024};
use period_common::config::{ConfigError, ForcedFallback, PeriodConfig};
use period_core::{PeriodError, PeriodRegistry};
use std::time::Duration;

#[test]
fn test_registry_from_config_file() {
    let config = config_from_str(&format!(
        r#"
origin_timestamp = {ORIGIN_2024}
span = {MINUTE}
test_environment = true
force = true

[time_source]
server = "time.example.org"
timeout = "250ms"
fallback = "query_result"
"#
    ));
    assert_eq!(config.time_source.timeout, Duration::from_millis(250));
    assert_eq!(config.time_source.fallback, ForcedFallback::QueryResult);
    assert_eq!(config.time_source.server_address(), "time.example.org:123");

    let registry = PeriodRegistry::from_config(&config).unwrap();
    assert!(registry.is_test_environment());
    assert!(registry.force());
    assert_eq!(registry.clock().fallback(), ForcedFallback::QueryResult);
    assert_eq!(registry.get(ORIGIN_2024 + 90_000).unwrap().id(), 2);

    // Test mode reads the local clock, which is well past 2024-01-01
    assert!(registry.current().unwrap().id() > 1);
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = config_from_str("");
    assert_eq!(config, PeriodConfig::default());
    assert_eq!(config.span, 10_000);
    assert_eq!(config.time_source.server_address(), "pool.ntp.org:123");
    assert_eq!(config.time_source.fallback, ForcedFallback::LocalClock);
}

#[test]
fn test_zero_span_in_file_is_rejected() {
    let config = config_from_str("span = 0\ntest_environment = true");
    assert!(config.validate().is_err());
    assert_eq!(
        PeriodRegistry::from_config(&config).unwrap_err(),
        PeriodError::InvalidConfiguration("period span can't be null".into())
    );
}

#[test]
fn test_malformed_file_is_reported() {
    let file = write_config("span = \"ten seconds\"");
    assert!(matches!(
        PeriodConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));

    let file = write_config("[time_source]\ntimeout = \"soon\"");
    assert!(matches!(
        PeriodConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match PeriodConfig::from_file(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[test]
fn test_written_config_loads_back() {
    let config = PeriodConfig {
        origin_timestamp: ORIGIN_2024,
        span: MINUTE,
        test_environment: true,
        ..PeriodConfig::default()
    };
    let file = write_config(&config.to_toml().unwrap());
    assert_eq!(PeriodConfig::from_file(file.path()).unwrap(), config);
}
