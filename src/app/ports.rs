//! Port traits: the hexagonal boundary between the node core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ sampler / liveness / edge / boot (domain)
//! ```
//!
//! Driven adapters (ADC channels, GPIO, the storage volume, the network
//! stack, the wall clock) implement these traits.  The domain consumes them
//! via generics or trait objects, so it never touches hardware directly and
//! every component runs on the host under test.

use core::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use time::OffsetDateTime;

use super::records::LogRecord;

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// A range-normalised analog input.
///
/// Reads are best effort: a converter fault yields the range minimum
/// rather than an error.
pub trait AnalogInput: Send {
    /// Map the converter's full scale onto `[min, max)`.
    fn set_range(&mut self, min: u16, max: u16);

    /// Sample the input once.
    fn read(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Edge input port (driven adapter: GPIO interrupt ↔ domain)
// ───────────────────────────────────────────────────────────────

/// An edge-sensitive digital input.
///
/// The input starts disarmed and delivers nothing until [`arm`](EdgeInput::arm).
/// After an edge is delivered it stays disarmed until
/// [`acknowledge`](EdgeInput::acknowledge) is called.  A handler that never
/// acknowledges never sees another edge.
pub trait EdgeInput: Send {
    /// Identifier of the monitored input (GPIO number).
    fn port(&self) -> u32;

    /// Start edge detection once a handler is registered.
    fn arm(&mut self);

    /// Clear the interrupt condition and re-arm detection.
    fn acknowledge(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Record sink port (driven adapter: domain → storage)
// ───────────────────────────────────────────────────────────────

/// Destination for timestamped log records.
///
/// `append` deliberately returns `()`: storage is a best-effort diagnostic
/// trail and the sampling loop must never depend on it.  Failure is only
/// observable as a missing line.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &LogRecord);
}

// ───────────────────────────────────────────────────────────────
// Volume port (driven adapter: domain ↔ filesystem driver)
// ───────────────────────────────────────────────────────────────

/// A mounted storage volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Logical volume name (e.g. `"SD"`).
    pub name: heapless::String<16>,
    /// Directory the volume's files live under.
    pub root: PathBuf,
}

/// Enumerates the volumes that are mounted *right now*.
///
/// Removable media can come and go at any time, so implementations must not
/// cache the answer.
pub trait VolumePort: Send + Sync {
    fn mounted(&self) -> Vec<VolumeInfo>;

    /// Root directory of the named volume, if it is currently mounted.
    fn find(&self, name: &str) -> Option<PathBuf> {
        self.mounted()
            .into_iter()
            .find(|v| v.name.as_str() == name)
            .map(|v| v.root)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock and time source ports
// ───────────────────────────────────────────────────────────────

/// The node's wall clock.
pub trait Clock: Send + Sync {
    /// Current wall-clock instant.
    fn now(&self) -> OffsetDateTime;

    /// Replace the wall-clock time.
    fn set(&self, now: OffsetDateTime) -> Result<(), TimeSyncError>;
}

/// Source of authoritative network time, queried once at boot.
pub trait TimeSource {
    fn network_time(&mut self) -> Result<OffsetDateTime, TimeSyncError>;
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain ↔ IP stack)
// ───────────────────────────────────────────────────────────────

/// Maximum number of interfaces reported by [`NetworkPort::interfaces`].
pub const MAX_INTERFACES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// Wired Ethernet.
    Ethernet,
    /// WiFi station or access point.
    Wireless,
    Other,
}

/// Point-in-time view of one network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// Stable index used to address the interface in later calls.
    pub index: usize,
    pub kind: InterfaceKind,
    /// Whether the DHCP client is running on this interface.
    pub dhcp_enabled: bool,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

pub trait NetworkPort {
    /// Enumerate every interface the stack knows about.
    fn interfaces(&self) -> Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError>;

    /// Switch the interface to dynamic address assignment.
    fn enable_dhcp(&mut self, index: usize) -> Result<(), NetError>;

    /// Request a fresh DHCP lease.
    fn renew_lease(&mut self, index: usize) -> Result<(), NetError>;

    /// Re-read a single interface.
    fn interface(&self, index: usize) -> Result<InterfaceInfo, NetError> {
        self.interfaces()?
            .into_iter()
            .find(|i| i.index == index)
            .ok_or(NetError::UnknownInterface(index))
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`NetworkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// The IP stack could not be queried (carries the platform return code).
    QueryFailed(i32),
    /// No interface with this index exists.
    UnknownInterface(usize),
    /// Starting or renewing the DHCP client failed.
    DhcpFailed(i32),
}

/// Errors from [`TimeSource`] and [`Clock`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSyncError {
    /// Server host name did not resolve.
    Resolve,
    /// Socket setup, send or receive failed.
    Network,
    /// No response within the configured timeout.
    Timeout,
    /// Response was short, not a server reply, or carried no timestamp.
    InvalidResponse,
    /// Server is unsynchronised or its stratum is out of range.
    InvalidStratum(u8),
    /// The platform refused the new wall-clock time.
    ClockRejected,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed(rc) => write!(f, "interface query failed (rc={})", rc),
            Self::UnknownInterface(i) => write!(f, "unknown interface #{}", i),
            Self::DhcpFailed(rc) => write!(f, "DHCP client failed (rc={})", rc),
        }
    }
}

impl fmt::Display for TimeSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "server did not resolve"),
            Self::Network => write!(f, "network I/O error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::InvalidResponse => write!(f, "invalid response"),
            Self::InvalidStratum(s) => write!(f, "invalid stratum {}", s),
            Self::ClockRejected => write!(f, "clock rejected new time"),
        }
    }
}
