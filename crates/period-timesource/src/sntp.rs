//! SNTPv4 client (RFC 4330).
//!
//! A single query sends one 48-byte client packet over UDP and reads one
//! server reply. The reply is validated and the local clock is corrected by
//! the measured offset:
//!
//! ```text
//! offset = ((t2 - t1) + (t3 - t4)) / 2
//! ```
//!
//! where `t1`/`t4` are the local send/receive instants and `t2`/`t3` the
//! server receive/transmit timestamps.

use crate::{TimeSource, TimeSourceError};
use period_common::config::TimeSourceConfig;
use period_common::time::unix_now_millis;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
pub const NTP_UNIX_OFFSET_SECS: u64 = 2_208_988_800;

/// Protocol version sent in requests.
pub const NTP_VERSION: u8 = 4;

/// Association modes used by SNTP.
pub mod mode {
    /// Client request.
    pub const CLIENT: u8 = 3;
    /// Server reply.
    pub const SERVER: u8 = 4;
}

/// Leap indicator value meaning "clock not synchronized".
const LEAP_ALARM: u8 = 3;

/// NTP 64-bit timestamp: seconds since 1900 plus a 32-bit binary fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NtpTimestamp {
    /// Whole seconds since the NTP epoch (modulo 2^32).
    pub seconds: u32,
    /// Fractional second in units of 2^-32 s.
    pub fraction: u32,
}

impl NtpTimestamp {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    /// Convert Unix epoch milliseconds into an NTP timestamp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_unix_millis(millis: u64) -> Self {
        let seconds = (millis / 1_000).wrapping_add(NTP_UNIX_OFFSET_SECS);
        let fraction = ((millis % 1_000) << 32) / 1_000;
        Self {
            seconds: seconds as u32,
            fraction: fraction as u32,
        }
    }

    /// Convert to Unix epoch milliseconds, rounding the fraction to the nearest millisecond.
    ///
    /// Second counts below the Unix offset are read as NTP era 1 (after 2036-02-07).
    #[must_use]
    pub fn to_unix_millis(self) -> u64 {
        let mut seconds = u64::from(self.seconds);
        if seconds < NTP_UNIX_OFFSET_SECS {
            seconds += 1 << 32;
        }
        let frac_millis = (u64::from(self.fraction) * 1_000 + (1 << 31)) >> 32;
        (seconds - NTP_UNIX_OFFSET_SECS) * 1_000 + frac_millis
    }

    /// Returns true for the all-zero timestamp.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }

    fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.seconds.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.fraction.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            seconds: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            fraction: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// SNTP packet header (extension fields and authenticator are ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SntpPacket {
    /// Leap indicator (2 bits).
    pub leap_indicator: u8,
    /// Version number (3 bits).
    pub version: u8,
    /// Association mode (3 bits).
    pub mode: u8,
    /// Stratum; 0 marks a kiss-o'-death reply.
    pub stratum: u8,
    /// Poll interval exponent.
    pub poll: i8,
    /// Clock precision exponent.
    pub precision: i8,
    /// Root delay (NTP short format).
    pub root_delay: u32,
    /// Root dispersion (NTP short format).
    pub root_dispersion: u32,
    /// Reference identifier, or the kiss code when stratum is 0.
    pub reference_id: [u8; 4],
    /// Time the server clock was last set.
    pub reference: NtpTimestamp,
    /// Client transmit time echoed back by the server.
    pub originate: NtpTimestamp,
    /// Server receive time.
    pub receive: NtpTimestamp,
    /// Transmit time of this packet.
    pub transmit: NtpTimestamp,
}

impl SntpPacket {
    /// Header size in bytes.
    pub const SIZE: usize = 48;

    /// Build a client request stamped with `transmit`.
    #[must_use]
    pub fn request(transmit: NtpTimestamp) -> Self {
        Self {
            version: NTP_VERSION,
            mode: mode::CLIENT,
            transmit,
            ..Self::default()
        }
    }

    /// Serialize the packet to bytes (big-endian).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = ((self.leap_indicator & 0x03) << 6)
            | ((self.version & 0x07) << 3)
            | (self.mode & 0x07);
        bytes[1] = self.stratum;
        bytes[2] = self.poll.to_be_bytes()[0];
        bytes[3] = self.precision.to_be_bytes()[0];
        bytes[4..8].copy_from_slice(&self.root_delay.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.root_dispersion.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.reference_id);
        bytes[16..24].copy_from_slice(&self.reference.to_bytes());
        bytes[24..32].copy_from_slice(&self.originate.to_bytes());
        bytes[32..40].copy_from_slice(&self.receive.to_bytes());
        bytes[40..48].copy_from_slice(&self.transmit.to_bytes());
        bytes
    }

    /// Parse a packet from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TimeSourceError::Malformed`] if fewer than 48 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TimeSourceError> {
        if bytes.len() < Self::SIZE {
            return Err(TimeSourceError::Malformed(format!(
                "SNTP packet too short: {} bytes",
                bytes.len()
            )));
        }

        Ok(Self {
            leap_indicator: bytes[0] >> 6,
            version: (bytes[0] >> 3) & 0x07,
            mode: bytes[0] & 0x07,
            stratum: bytes[1],
            poll: i8::from_be_bytes([bytes[2]]),
            precision: i8::from_be_bytes([bytes[3]]),
            root_delay: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            root_dispersion: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            reference_id: [bytes[12], bytes[13], bytes[14], bytes[15]],
            reference: NtpTimestamp::from_bytes(&bytes[16..24]),
            originate: NtpTimestamp::from_bytes(&bytes[24..32]),
            receive: NtpTimestamp::from_bytes(&bytes[32..40]),
            transmit: NtpTimestamp::from_bytes(&bytes[40..48]),
        })
    }

    /// Kiss code carried in the reference ID of a stratum-0 reply.
    #[must_use]
    pub fn kiss_code(&self) -> String {
        self.reference_id
            .iter()
            .filter(|b| b.is_ascii_graphic())
            .map(|&b| char::from(b))
            .collect()
    }

    /// Check that `self` is an acceptable server reply to `request`.
    ///
    /// # Errors
    ///
    /// Returns an error for a wrong mode, a kiss-o'-death, an unsynchronized
    /// server, a mismatched originate timestamp, or a zero transmit timestamp.
    pub fn validate_reply(&self, request: &SntpPacket) -> Result<(), TimeSourceError> {
        if self.mode != mode::SERVER {
            return Err(TimeSourceError::Malformed(format!(
                "unexpected mode {} (expected {})",
                self.mode,
                mode::SERVER
            )));
        }
        if self.stratum == 0 {
            return Err(TimeSourceError::KissOfDeath {
                code: self.kiss_code(),
            });
        }
        if self.leap_indicator == LEAP_ALARM {
            return Err(TimeSourceError::Unsynchronized);
        }
        if self.originate != request.transmit {
            return Err(TimeSourceError::Malformed(
                "originate timestamp does not match request".into(),
            ));
        }
        if self.transmit.is_zero() {
            return Err(TimeSourceError::Malformed(
                "server transmit timestamp is zero".into(),
            ));
        }
        Ok(())
    }
}

/// Result of one successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SntpSample {
    /// Server transmit time (`t3`).
    pub server_millis: u64,
    /// Estimated local clock offset in milliseconds (server minus local).
    pub offset_millis: i64,
    /// Round-trip delay minus server processing time.
    pub round_trip_millis: u64,
    /// Server stratum.
    pub stratum: u8,
    /// Local receive time corrected by the offset.
    pub corrected_millis: u64,
}

impl SntpSample {
    /// Compute offset and delay from the four exchange timestamps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_exchange(t1: u64, t2: u64, t3: u64, t4: u64, stratum: u8) -> Self {
        let (t1, t2, t3, t4) = (
            i128::from(t1),
            i128::from(t2),
            i128::from(t3),
            i128::from(t4),
        );
        let offset = ((t2 - t1) + (t3 - t4)) / 2;
        let round_trip = ((t4 - t1) - (t3 - t2)).max(0);
        let corrected = (t4 + offset).clamp(0, i128::from(u64::MAX));

        Self {
            server_millis: t3 as u64,
            offset_millis: offset.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
            round_trip_millis: round_trip.min(i128::from(u64::MAX)) as u64,
            stratum,
            corrected_millis: corrected as u64,
        }
    }
}

/// SNTP client querying a single server.
#[derive(Debug, Clone)]
pub struct SntpClient {
    server: String,
    timeout: Duration,
}

impl Default for SntpClient {
    fn default() -> Self {
        Self::from_config(&TimeSourceConfig::default())
    }
}

impl SntpClient {
    /// Create a client for `server` (host:port) with the given read timeout.
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
        }
    }

    /// Create a client from the `time_source` configuration section.
    #[must_use]
    pub fn from_config(config: &TimeSourceConfig) -> Self {
        Self::new(config.server_address(), config.timeout)
    }

    /// Configured server address.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Configured read timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn resolve(&self) -> Result<SocketAddr, TimeSourceError> {
        self.server
            .to_socket_addrs()
            .map_err(|e| TimeSourceError::Resolve {
                server: self.server.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| TimeSourceError::Resolve {
                server: self.server.clone(),
                reason: "no addresses returned".into(),
            })
    }

    /// Perform one request/reply exchange.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeSourceError`] on resolution, socket, timeout, or
    /// validation failure.
    pub fn query(&self) -> Result<SntpSample, TimeSourceError> {
        let addr = self.resolve()?;
        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;

        // A zero timeout is rejected by the OS
        let timeout = self.timeout.max(Duration::from_millis(1));
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;
        socket.connect(addr)?;

        let t1 = unix_now_millis();
        let request = SntpPacket::request(NtpTimestamp::from_unix_millis(t1));
        trace!(server = %addr, "Sending SNTP request");
        socket.send(&request.to_bytes())?;

        let mut buf = [0u8; 128];
        let len = socket.recv(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => TimeSourceError::Timeout {
                server: self.server.clone(),
                timeout,
            },
            _ => TimeSourceError::Io(e),
        })?;
        let t4 = unix_now_millis();

        let reply = SntpPacket::from_bytes(&buf[..len])?;
        if let Err(e) = reply.validate_reply(&request) {
            warn!(server = %addr, error = %e, "Rejected SNTP reply");
            return Err(e);
        }

        let sample = SntpSample::from_exchange(
            t1,
            reply.receive.to_unix_millis(),
            reply.transmit.to_unix_millis(),
            t4,
            reply.stratum,
        );
        debug!(
            server = %addr,
            offset_ms = sample.offset_millis,
            round_trip_ms = sample.round_trip_millis,
            stratum = sample.stratum,
            "SNTP exchange complete"
        );
        Ok(sample)
    }
}

impl TimeSource for SntpClient {
    fn current_millis(&self) -> Result<u64, TimeSourceError> {
        self.query().map(|sample| sample.corrected_millis)
    }
}
