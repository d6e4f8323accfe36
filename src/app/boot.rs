//! Boot sequencer.
//!
//! Runs once on the main thread, strictly in order:
//!
//! ```text
//! network ──▶ time sync ──▶ analog ranges + edge handler ──▶ arm tasks ──▶ park
//! ```
//!
//! The edge input stays disarmed until its handler is registered, so edges
//! during network bring-up and time sync are never delivered.
//!
//! Every step blocks until it completes.  After [`Boot::run`] hands back the
//! armed [`Scheduler`] the caller starts it and parks the main thread; the
//! node's steady state lives entirely in the scheduler thread.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{info, warn};
use time::OffsetDateTime;

use super::edge::{EdgeEventHandler, EdgeLatch};
use super::liveness::LivenessPulse;
use super::ports::{
    AnalogInput, Clock, EdgeInput, InterfaceInfo, InterfaceKind, MAX_INTERFACES, NetError, NetworkPort,
    RecordSink, TimeSource, TimeSyncError,
};
use super::records::{LogRecord, LogStream, format_timestamp};
use super::sampler::{PeriodicSampler, SamplerSpec};
use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;

/// First record written to the system stream once boot has finished.
pub const STARTUP_MESSAGE: &str = "Starting application ...";

/// Physical I/O the scheduled tasks take ownership of.
pub struct NodeIo<L, T, E, P> {
    pub light: L,
    pub temperature: T,
    pub edge: E,
    pub edge_latch: &'static EdgeLatch,
    pub liveness: P,
}

/// Shared services every boot step uses.
pub struct Boot<'a> {
    config: &'a NodeConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn RecordSink>,
}

impl<'a> Boot<'a> {
    pub fn new(config: &'a NodeConfig, clock: Arc<dyn Clock>, sink: Arc<dyn RecordSink>) -> Self {
        Self { config, clock, sink }
    }

    /// Run the whole sequence and return the armed scheduler.
    pub fn run<N, S, L, T, E, P>(
        &self,
        network: &mut N,
        time_source: &mut S,
        io: NodeIo<L, T, E, P>,
    ) -> Result<Scheduler>
    where
        N: NetworkPort + ?Sized,
        S: TimeSource + ?Sized,
        L: AnalogInput + 'static,
        T: AnalogInput + 'static,
        E: EdgeInput + 'static,
        P: OutputPin + Send + 'static,
    {
        self.config.validate().map_err(Error::Config)?;
        match serde_json::to_string(self.config) {
            Ok(json) => info!("BOOT | config={}", json),
            Err(e) => warn!("BOOT | config trace failed: {}", e),
        }

        bring_up_network(network, self.config.dhcp_settle())?;

        match sync_clock(time_source, &*self.clock, &*self.sink) {
            Ok(_) => {}
            Err(e) if !self.config.require_time_sync => {
                warn!("BOOT | time sync failed ({}), continuing with unsynchronised clock", e);
            }
            Err(e) => return Err(e.into()),
        }

        info!("BOOT | {}", STARTUP_MESSAGE);
        self.log_system(STARTUP_MESSAGE);

        self.arm(io)
    }

    /// Configure the inputs and load every task into a fresh scheduler.
    pub fn arm<L, T, E, P>(&self, io: NodeIo<L, T, E, P>) -> Result<Scheduler>
    where
        L: AnalogInput + 'static,
        T: AnalogInput + 'static,
        E: EdgeInput + 'static,
        P: OutputPin + Send + 'static,
    {
        let NodeIo {
            mut light,
            mut temperature,
            mut edge,
            edge_latch,
            liveness,
        } = io;
        let (min, max) = (self.config.analog_range_min, self.config.analog_range_max);
        light.set_range(min, max);
        temperature.set_range(min, max);

        let mut sched = Scheduler::new();

        let mut handler = EdgeEventHandler::new(self.clock.clone());
        edge_latch.clear();
        edge.arm();
        sched.on_edge(edge, edge_latch, move |level, input| {
            handler.handle(level, input);
        });

        let mut pulse = LivenessPulse::new(liveness);
        sched
            .every("liveness", self.config.liveness_period(), move || {
                pulse.pulse();
            })
            .ok_or(Error::Init("liveness task rejected"))?;

        let light = PeriodicSampler::new(
            SamplerSpec::light(self.config.light_period()),
            light,
            self.clock.clone(),
            self.sink.clone(),
        );
        arm_sampler(&mut sched, light)?;

        let temperature = PeriodicSampler::new(
            SamplerSpec::temperature(self.config.temperature_period()),
            temperature,
            self.clock.clone(),
            self.sink.clone(),
        );
        arm_sampler(&mut sched, temperature)?;

        Ok(sched)
    }

    fn log_system(&self, message: &str) {
        self.sink
            .append(&LogRecord::new(LogStream::System, self.clock.now(), message));
    }
}

fn arm_sampler<A: AnalogInput + 'static>(sched: &mut Scheduler, mut sampler: PeriodicSampler<A>) -> Result<()> {
    let spec = sampler.spec();
    sched
        .every(spec.label(), spec.period, move || {
            sampler.fire();
        })
        .map(|_| ())
        .ok_or(Error::Init("sampler task rejected"))
}

/// Put every wired interface on DHCP and wait for its lease.
///
/// Interfaces already running DHCP are left alone.  Returns the wired
/// interfaces as seen after bring-up.
pub fn bring_up_network<N: NetworkPort + ?Sized>(
    network: &mut N,
    settle: Duration,
) -> core::result::Result<heapless::Vec<InterfaceInfo, MAX_INTERFACES>, NetError> {
    let mut wired = heapless::Vec::new();

    for iface in network.interfaces()? {
        if iface.kind != InterfaceKind::Ethernet {
            continue;
        }
        if !iface.dhcp_enabled {
            info!("NET | enabling DHCP on interface #{}", iface.index);
            network.enable_dhcp(iface.index)?;
            network.renew_lease(iface.index)?;
            std::thread::sleep(settle);
        }

        let now = network.interface(iface.index)?;
        info!("NET | IP Address: {}", now.address);
        info!("NET | Subnet mask: {}", now.netmask);
        let _ = wired.push(now);
    }

    Ok(wired)
}

/// Fetch network time, apply it and record the change.
pub fn sync_clock<S: TimeSource + ?Sized>(
    source: &mut S,
    clock: &dyn Clock,
    sink: &dyn RecordSink,
) -> core::result::Result<OffsetDateTime, TimeSyncError> {
    let now = source.network_time()?;
    clock.set(now)?;

    let message = format!("SetLocalTime to {}", format_timestamp(&now));
    info!("TIME | {}", message);
    sink.append(&LogRecord::new(LogStream::System, clock.now(), message));
    Ok(now)
}

/// Hand the CPU to the scheduler for good.
///
/// The main thread stays parked, waking every `period` to run `on_wake`
/// (storage upkeep on target).
pub fn park_forever(period: Duration, mut on_wake: impl FnMut()) -> ! {
    loop {
        std::thread::park_timeout(period);
        on_wake();
    }
}
