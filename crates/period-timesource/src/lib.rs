//! Time source abstractions for period numbering.
//!
//! This crate provides:
//! - [`TimeSource`] trait for anything that reports the current epoch milliseconds
//! - [`local`] module with a strictly increasing local wall clock
//! - [`sntp`] module with an SNTPv4 network client
//! - [`simulated`] module with fixed and failing sources for tests
//! - [`clock`] module with [`ClockSource`], which picks between network and local
//!   time and applies the forced fallback policy

pub mod clock;
pub mod local;
pub mod simulated;
pub mod sntp;

pub use clock::ClockSource;
pub use local::LocalClock;
pub use simulated::{FailingTimeSource, FixedTimeSource};
pub use sntp::{NtpTimestamp, SntpClient, SntpPacket, SntpSample};

use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading a time source.
#[derive(Debug, Error)]
pub enum TimeSourceError {
    /// The server address did not resolve to a socket address.
    #[error("cannot resolve time server {server}: {reason}")]
    Resolve {
        /// Configured server address.
        server: String,
        /// Resolver failure description.
        reason: String,
    },

    /// No reply arrived within the read timeout.
    #[error("time server {server} did not answer within {timeout:?}")]
    Timeout {
        /// Queried server address.
        server: String,
        /// Configured read timeout.
        timeout: Duration,
    },

    /// Socket-level failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply could not be decoded or failed validation.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Server asked the client to go away (stratum 0).
    #[error("server sent kiss-o'-death {code:?}")]
    KissOfDeath {
        /// Four-character ASCII code from the reference ID field.
        code: String,
    },

    /// Server reported an unsynchronized clock (leap indicator 3).
    #[error("server clock is not synchronized")]
    Unsynchronized,

    /// Source is unavailable for another reason.
    #[error("time source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can report the current time as milliseconds since the Unix epoch.
pub trait TimeSource: Send + Sync + std::fmt::Debug {
    /// Read the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeSourceError`] if the source cannot produce a value.
    fn current_millis(&self) -> Result<u64, TimeSourceError>;
}
