//! Mock hardware and services for integration tests.
//!
//! Every mock hands out shared handles so a test can keep observing it
//! after the mock itself has moved into a scheduler task.

use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embedded_hal::digital::{ErrorType, OutputPin};
use sdlogger::app::edge::EdgeLatch;
use sdlogger::app::ports::{
    AnalogInput, Clock, InterfaceInfo, InterfaceKind, MAX_INTERFACES, NetError, NetworkPort, TimeSource,
    TimeSyncError, VolumeInfo, VolumePort,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub const SYNCED_AT: OffsetDateTime = datetime!(2026-10-16 08:30:00 UTC);

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sdlogger-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A latch with the `'static` lifetime the scheduler needs.
pub fn leak_latch() -> &'static EdgeLatch {
    Box::leak(Box::new(EdgeLatch::new()))
}

// ── Analog input ──────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockAnalog {
    pub raw: Arc<AtomicU16>,
    pub range: Arc<Mutex<Option<(u16, u16)>>>,
    pub reads: Arc<AtomicUsize>,
}

impl MockAnalog {
    pub fn reading(raw: u16) -> Self {
        let m = Self::default();
        m.raw.store(raw, Ordering::SeqCst);
        m
    }
}

impl AnalogInput for MockAnalog {
    fn set_range(&mut self, min: u16, max: u16) {
        *self.range.lock().unwrap() = Some((min, max));
    }

    fn read(&mut self) -> u16 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.raw.load(Ordering::SeqCst)
    }
}

// ── Output pin ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingPin {
    pub levels: Arc<Mutex<Vec<bool>>>,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.lock().unwrap().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.lock().unwrap().push(true);
        Ok(())
    }
}

// ── Clock and time source ─────────────────────────────────────

pub struct MockClock {
    now: Mutex<OffsetDateTime>,
}

impl MockClock {
    pub fn unsynced() -> Self {
        Self {
            now: Mutex::new(datetime!(1970-01-01 00:00:00 UTC)),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }

    fn set(&self, now: OffsetDateTime) -> Result<(), TimeSyncError> {
        *self.now.lock().unwrap() = now;
        Ok(())
    }
}

pub struct MockTimeSource {
    pub answer: Result<OffsetDateTime, TimeSyncError>,
    pub queries: usize,
}

impl MockTimeSource {
    pub fn ok() -> Self {
        Self {
            answer: Ok(SYNCED_AT),
            queries: 0,
        }
    }

    pub fn failing(e: TimeSyncError) -> Self {
        Self {
            answer: Err(e),
            queries: 0,
        }
    }
}

impl TimeSource for MockTimeSource {
    fn network_time(&mut self) -> Result<OffsetDateTime, TimeSyncError> {
        self.queries += 1;
        self.answer
    }
}

// ── Network ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum NetCall {
    EnableDhcp(usize),
    RenewLease(usize),
}

pub struct MockNetwork {
    pub ifaces: heapless::Vec<InterfaceInfo, MAX_INTERFACES>,
    pub calls: Vec<NetCall>,
    pub query_error: Option<NetError>,
}

impl MockNetwork {
    /// One wired interface with DHCP off.
    pub fn static_ethernet() -> Self {
        let mut ifaces = heapless::Vec::new();
        let _ = ifaces.push(InterfaceInfo {
            index: 0,
            kind: InterfaceKind::Ethernet,
            dhcp_enabled: false,
            address: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
        });
        Self {
            ifaces,
            calls: Vec::new(),
            query_error: None,
        }
    }

    pub fn broken(e: NetError) -> Self {
        Self {
            query_error: Some(e),
            ..Self::static_ethernet()
        }
    }
}

impl NetworkPort for MockNetwork {
    fn interfaces(&self) -> Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError> {
        match self.query_error {
            Some(e) => Err(e),
            None => Ok(self.ifaces.clone()),
        }
    }

    fn enable_dhcp(&mut self, index: usize) -> Result<(), NetError> {
        self.calls.push(NetCall::EnableDhcp(index));
        self.ifaces[index].dhcp_enabled = true;
        Ok(())
    }

    fn renew_lease(&mut self, index: usize) -> Result<(), NetError> {
        self.calls.push(NetCall::RenewLease(index));
        self.ifaces[index].address = Ipv4Addr::new(192, 168, 0, 42);
        self.ifaces[index].netmask = Ipv4Addr::new(255, 255, 255, 0);
        Ok(())
    }
}

// ── Volume ────────────────────────────────────────────────────

/// Volume `"SD"` at a fixed root whose presence the test toggles, while the
/// directory itself stays on disk.
#[derive(Clone)]
pub struct SwitchableVolume {
    pub root: PathBuf,
    pub present: Arc<AtomicBool>,
}

impl SwitchableVolume {
    pub fn absent(root: PathBuf) -> Self {
        Self {
            root,
            present: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }
}

impl VolumePort for SwitchableVolume {
    fn mounted(&self) -> Vec<VolumeInfo> {
        if !self.present.load(Ordering::SeqCst) {
            return Vec::new();
        }
        let mut name = heapless::String::new();
        name.push_str("SD").unwrap();
        vec![VolumeInfo {
            name,
            root: self.root.clone(),
        }]
    }
}
