//! Acceptance test modules.
//!
//! Every test uses its own registry, so the suite runs in parallel and
//! needs neither network access nor special privileges.

mod clock_test;
mod config_test;
mod lifecycle_test;
mod tiling_test;
