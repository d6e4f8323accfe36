//! SNTP time source.
//!
//! One-shot unicast query (RFC 4330) over a std UDP socket, which ESP-IDF's
//! lwIP backs on target.  The reply's transmit timestamp is the authoritative
//! time; half the measured round trip is added to it.
//!
//! Packet layout used here (48 bytes):
//!
//! ```text
//! byte 0      LI(2) | VN(3) | Mode(3)
//! byte 1      stratum
//! bytes 40-47 transmit timestamp (u32 seconds since 1900, u32 fraction)
//! ```

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, info};
use time::OffsetDateTime;

use crate::app::ports::{TimeSource, TimeSyncError};
use crate::config::NodeConfig;

pub const NTP_PACKET_LEN: usize = 48;

/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_REQUEST_HEADER: u8 = 0x1B;

const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;
const LEAP_UNSYNCHRONISED: u8 = 3;
const MAX_STRATUM: u8 = 15;

/// Seconds between 1900-01-01 and 1970-01-01.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Seconds in one NTP era (2^32).
const NTP_ERA_SECONDS: i64 = 1 << 32;

const TRANSMIT_TS_OFFSET: usize = 40;

pub struct SntpTimeSource {
    server: String,
    port: u16,
    timeout: Duration,
}

impl SntpTimeSource {
    pub fn new(server: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(
            config.ntp_server.clone(),
            config.ntp_port,
            Duration::from_millis(u64::from(config.ntp_timeout_ms)),
        )
    }

    fn resolve(&self) -> Result<SocketAddr, TimeSyncError> {
        (self.server.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| TimeSyncError::Resolve)?
            .find(SocketAddr::is_ipv4)
            .ok_or(TimeSyncError::Resolve)
    }
}

/// A client-mode request with every other field zero.
pub fn request_packet() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = CLIENT_REQUEST_HEADER;
    packet
}

/// Validate a server reply and extract its transmit timestamp.
pub fn parse_response(buf: &[u8]) -> Result<OffsetDateTime, TimeSyncError> {
    if buf.len() < NTP_PACKET_LEN {
        return Err(TimeSyncError::InvalidResponse);
    }

    let mode = buf[0] & 0x07;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(TimeSyncError::InvalidResponse);
    }

    let stratum = buf[1];
    let leap = buf[0] >> 6;
    if leap == LEAP_UNSYNCHRONISED || stratum == 0 || stratum > MAX_STRATUM {
        return Err(TimeSyncError::InvalidStratum(stratum));
    }

    let ts = &buf[TRANSMIT_TS_OFFSET..TRANSMIT_TS_OFFSET + 8];
    let seconds = u32::from_be_bytes([ts[0], ts[1], ts[2], ts[3]]);
    let fraction = u32::from_be_bytes([ts[4], ts[5], ts[6], ts[7]]);
    if seconds == 0 && fraction == 0 {
        return Err(TimeSyncError::InvalidResponse);
    }

    // MSB clear means era 1 (after 2036-02-07).
    let mut unix = i64::from(seconds) - NTP_UNIX_OFFSET;
    if seconds & 0x8000_0000 == 0 {
        unix += NTP_ERA_SECONDS;
    }
    let nanos = ((u64::from(fraction) * 1_000_000_000) >> 32) as i64;

    let whole = OffsetDateTime::from_unix_timestamp(unix).map_err(|_| TimeSyncError::InvalidResponse)?;
    Ok(whole + time::Duration::nanoseconds(nanos))
}

fn classify(e: &io::Error) -> TimeSyncError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TimeSyncError::Timeout,
        _ => TimeSyncError::Network,
    }
}

impl TimeSource for SntpTimeSource {
    fn network_time(&mut self) -> Result<OffsetDateTime, TimeSyncError> {
        let server = self.resolve()?;
        debug!("SNTP | server={} addr={}", self.server, server);

        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|_| TimeSyncError::Network)?;
        socket
            .set_read_timeout(Some(self.timeout))
            .map_err(|_| TimeSyncError::Network)?;

        let sent_at = Instant::now();
        socket
            .send_to(&request_packet(), server)
            .map_err(|e| classify(&e))?;

        let mut buf = [0u8; 64];
        let deadline = sent_at + self.timeout;
        loop {
            let (n, from) = socket.recv_from(&mut buf).map_err(|e| classify(&e))?;
            if from.ip() == server.ip() {
                let rtt = sent_at.elapsed();
                let time = parse_response(&buf[..n])?;
                let adjusted = time + rtt / 2;
                info!("SNTP | stratum={} rtt_ms={}", buf[1], rtt.as_millis());
                return Ok(adjusted);
            }
            // Stray datagram; keep waiting out the first deadline.
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TimeSyncError::Timeout);
            }
            socket
                .set_read_timeout(Some(remaining))
                .map_err(|_| TimeSyncError::Network)?;
        }
    }
}
