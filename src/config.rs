//! Node configuration parameters
//!
//! All tunable parameters for the SdLogger node.  Values are compiled-in
//! defaults; the node never persists configuration.

use std::time::Duration;

use serde::Serialize;

use crate::app::records::{LogStream, RAW_RANGE_MAX};

/// Core node configuration
#[derive(Debug, Clone, Serialize)]
pub struct NodeConfig {
    // --- Storage ---
    /// Logical name of the removable volume the sink writes to
    pub volume_name: String,
    /// Filesystem path the volume is mounted at
    pub mount_point: String,
    /// Interval between mount attempts while the card is absent (milliseconds)
    pub card_retry_ms: u32,
    /// File name of the general startup/status log
    pub system_log: String,
    /// File name of the light-sensor log
    pub light_log: String,
    /// File name of the temperature log
    pub temperature_log: String,

    // --- Timing ---
    /// Liveness output toggle period (milliseconds)
    pub liveness_period_ms: u32,
    /// Light sampling period (milliseconds)
    pub light_period_ms: u32,
    /// Temperature sampling period (milliseconds)
    pub temperature_period_ms: u32,
    /// Wait after requesting a DHCP lease (milliseconds)
    pub dhcp_settle_ms: u32,

    // --- Time sync ---
    /// SNTP server host name or address
    pub ntp_server: String,
    /// SNTP server UDP port
    pub ntp_port: u16,
    /// SNTP response timeout (milliseconds)
    pub ntp_timeout_ms: u32,
    /// Abort boot when network time cannot be fetched
    pub require_time_sync: bool,

    // --- Analog inputs ---
    /// Lower bound of the normalised analog range (inclusive)
    pub analog_range_min: u16,
    /// Upper bound of the normalised analog range (exclusive)
    pub analog_range_max: u16,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Storage
            volume_name: "SD".into(),
            mount_point: "/sdcard".into(),
            card_retry_ms: 10_000,
            system_log: "out.log".into(),
            light_log: "light.log".into(),
            temperature_log: "temp.log".into(),

            // Timing
            liveness_period_ms: 1_000,      // 1 Hz
            light_period_ms: 60_000,        // 1/min
            temperature_period_ms: 60_000,  // 1/min
            dhcp_settle_ms: 10_000,

            // Time sync
            ntp_server: "pool.ntp.org".into(),
            ntp_port: 123,
            ntp_timeout_ms: 5_000,
            require_time_sync: true,

            // Analog inputs
            analog_range_min: 0,
            analog_range_max: RAW_RANGE_MAX,
        }
    }
}

impl NodeConfig {
    /// File name backing a log stream.
    pub fn stream_file(&self, stream: LogStream) -> &str {
        match stream {
            LogStream::System => &self.system_log,
            LogStream::Light => &self.light_log,
            LogStream::Temperature => &self.temperature_log,
        }
    }

    pub fn liveness_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.liveness_period_ms))
    }

    pub fn light_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.light_period_ms))
    }

    pub fn temperature_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.temperature_period_ms))
    }

    pub fn dhcp_settle(&self) -> Duration {
        Duration::from_millis(u64::from(self.dhcp_settle_ms))
    }

    pub fn card_retry_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.card_retry_ms))
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.volume_name.is_empty() || self.volume_name.len() > 16 {
            return Err("volume_name must be 1-16 bytes");
        }
        if self.liveness_period_ms == 0
            || self.light_period_ms == 0
            || self.temperature_period_ms == 0
            || self.card_retry_ms == 0
        {
            return Err("task periods must be non-zero");
        }
        if self.analog_range_min >= self.analog_range_max {
            return Err("analog range is empty");
        }
        if self.ntp_server.is_empty() {
            return Err("ntp_server is empty");
        }
        Ok(())
    }
}
