//! End-to-end boot: network, time sync, task arming, and the log files
//! the running scheduler produces.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use sdlogger::adapters::log_sink::StorageLogSink;
use sdlogger::adapters::volume::MountTable;
use sdlogger::app::boot::{Boot, NodeIo, STARTUP_MESSAGE};
use sdlogger::app::edge::EdgeLatch;
use sdlogger::app::ports::{Clock, NetError, RecordSink, TimeSyncError};
use sdlogger::config::NodeConfig;
use sdlogger::drivers::edge_input::EdgeInputPin;
use sdlogger::error::Error;

use crate::mock_hw::*;

fn fast_config() -> NodeConfig {
    NodeConfig {
        liveness_period_ms: 20,
        light_period_ms: 100,
        temperature_period_ms: 100,
        dhcp_settle_ms: 0,
        ..NodeConfig::default()
    }
}

struct Rig {
    config: NodeConfig,
    dir: std::path::PathBuf,
    sink: Arc<StorageLogSink<MountTable>>,
    clock: Arc<MockClock>,
    light: MockAnalog,
    temperature: MockAnalog,
    pin: RecordingPin,
}

impl Rig {
    fn new(name: &str, config: NodeConfig) -> Self {
        let dir = scratch_dir(name);
        let volumes = MountTable::new().with_mount("SD", &dir);
        Self {
            sink: Arc::new(StorageLogSink::new(volumes, &config)),
            config,
            dir,
            clock: Arc::new(MockClock::unsynced()),
            light: MockAnalog::reading(200),
            temperature: MockAnalog::reading(500),
            pin: RecordingPin::default(),
        }
    }

    fn boot(
        &self,
        network: &mut MockNetwork,
        time: &mut MockTimeSource,
    ) -> Result<sdlogger::scheduler::Scheduler, Error> {
        let latch = leak_latch();
        let edge = EdgeInputPin::attach(latch).unwrap();
        self.boot_with_edge(network, time, edge, latch)
    }

    fn boot_with_edge(
        &self,
        network: &mut MockNetwork,
        time: &mut MockTimeSource,
        edge: EdgeInputPin,
        latch: &'static EdgeLatch,
    ) -> Result<sdlogger::scheduler::Scheduler, Error> {
        let io = NodeIo {
            light: self.light.clone(),
            temperature: self.temperature.clone(),
            edge,
            edge_latch: latch,
            liveness: self.pin.clone(),
        };
        let clock: Arc<dyn Clock> = self.clock.clone();
        let sink: Arc<dyn RecordSink> = self.sink.clone();
        Boot::new(&self.config, clock, sink).run(network, time, io)
    }

    fn read(&self, file: &str) -> String {
        fs::read_to_string(self.dir.join(file)).unwrap_or_default()
    }
}

#[test]
fn full_boot_produces_all_three_logs() {
    let rig = Rig::new("boot-full", fast_config());
    let mut net = MockNetwork::static_ethernet();
    let mut time = MockTimeSource::ok();

    let sched = rig.boot(&mut net, &mut time).unwrap();
    assert_eq!(net.calls, vec![NetCall::EnableDhcp(0), NetCall::RenewLease(0)]);
    assert_eq!(time.queries, 1);
    assert_eq!(sched.task_count(), 4);

    let _h = sched.spawn().unwrap();
    std::thread::sleep(Duration::from_millis(450));

    let out = rig.read("out.log");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "2026-10-16 08:30:00: SetLocalTime to 2026-10-16 08:30:00");
    assert_eq!(lines[1], format!("2026-10-16 08:30:00: {}", STARTUP_MESSAGE));

    let light = rig.read("light.log");
    assert!(light.lines().count() >= 2);
    assert!(light.lines().all(|l| l.ends_with(": Light level 200")));

    let temp = rig.read("temp.log");
    assert!(temp.lines().count() >= 2);
    assert!(temp.lines().all(|l| l.ends_with(": Temperature: 120.8984375")));

    assert_eq!(*rig.light.range.lock().unwrap(), Some((0, 1024)));
    assert_eq!(*rig.temperature.range.lock().unwrap(), Some((0, 1024)));

    let levels = rig.pin.levels.lock().unwrap().clone();
    assert!(levels.len() >= 10, "liveness pulsed {} times", levels.len());
    assert!(levels[0]);
    assert!(levels.windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn nothing_samples_before_the_first_period() {
    let config = NodeConfig {
        light_period_ms: 60_000,
        temperature_period_ms: 60_000,
        ..fast_config()
    };
    let rig = Rig::new("boot-quiet", config);
    let sched = rig
        .boot(&mut MockNetwork::static_ethernet(), &mut MockTimeSource::ok())
        .unwrap();
    let _h = sched.spawn().unwrap();
    std::thread::sleep(Duration::from_millis(150));

    assert_eq!(rig.light.reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!rig.dir.join("light.log").exists());
    assert!(!rig.dir.join("temp.log").exists());
}

#[test]
fn time_sync_failure_is_fatal_by_default() {
    let rig = Rig::new("boot-fatal", fast_config());
    let mut time = MockTimeSource::failing(TimeSyncError::Timeout);

    let err = rig.boot(&mut MockNetwork::static_ethernet(), &mut time).unwrap_err();

    assert_eq!(err, Error::TimeSync(TimeSyncError::Timeout));
    assert!(!rig.read("out.log").contains(STARTUP_MESSAGE));
    assert_eq!(rig.sink.written(), 0);
}

#[test]
fn degraded_startup_when_sync_is_optional() {
    let config = NodeConfig {
        require_time_sync: false,
        ..fast_config()
    };
    let rig = Rig::new("boot-degraded", config);
    let mut time = MockTimeSource::failing(TimeSyncError::InvalidStratum(0));

    let sched = rig.boot(&mut MockNetwork::static_ethernet(), &mut time).unwrap();
    assert_eq!(sched.task_count(), 4);

    let out = rig.read("out.log");
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("1970-01-01 00:00:00: "));
    assert!(out.contains(STARTUP_MESSAGE));
    assert!(!out.contains("SetLocalTime"));
}

#[test]
fn interface_query_failure_stops_boot_before_time_sync() {
    let rig = Rig::new("boot-net", fast_config());
    let mut net = MockNetwork::broken(NetError::QueryFailed(-1));
    let mut time = MockTimeSource::ok();

    let err = rig.boot(&mut net, &mut time).unwrap_err();

    assert_eq!(err, Error::Network(NetError::QueryFailed(-1)));
    assert_eq!(time.queries, 0);
    assert!(!rig.dir.join("out.log").exists());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = NodeConfig {
        analog_range_min: 10,
        analog_range_max: 10,
        ..fast_config()
    };
    let rig = Rig::new("boot-config", config);
    let mut net = MockNetwork::static_ethernet();

    let err = rig.boot(&mut net, &mut MockTimeSource::ok()).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(net.calls.is_empty());
}

#[test]
fn edges_before_boot_are_never_delivered() {
    let rig = Rig::new("boot-edge", fast_config());
    let latch = leak_latch();
    let edge = EdgeInputPin::attach(latch).unwrap();
    let wire = edge.trigger();

    assert!(!wire.fall(), "input armed before boot");
    assert!(!latch.is_pending());
    latch.raise(false);

    let sched = rig
        .boot_with_edge(&mut MockNetwork::static_ethernet(), &mut MockTimeSource::ok(), edge, latch)
        .unwrap();
    assert!(wire.is_armed());
    assert!(!latch.is_pending());

    let _h = sched.spawn().unwrap();
    assert!(wire.fall());
    std::thread::sleep(Duration::from_millis(100));
    assert!(wire.is_armed(), "handler did not acknowledge the edge");
    assert!(!latch.is_pending());
}
