//! Domain records: sensor readings, log records and edge events.
//!
//! All of these are ephemeral.  A reading lives for one sampling cycle, a
//! log record until its single write attempt, an edge event for one handler
//! invocation.

use core::fmt;

use time::OffsetDateTime;
use time::format_description;

use crate::sensors::temperature::celsius_from_raw;

/// Exclusive upper bound of a range-normalised raw sample.
pub const RAW_RANGE_MAX: u16 = 1024;

// ── Log streams ───────────────────────────────────────────────

/// A logical, append-only log on the storage volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStream {
    /// General startup / status log.
    System,
    Light,
    Temperature,
}

impl LogStream {
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timestamped line destined for a log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub stream: LogStream,
    pub timestamp: OffsetDateTime,
    pub message: String,
}

impl LogRecord {
    pub fn new(stream: LogStream, timestamp: OffsetDateTime, message: impl Into<String>) -> Self {
        Self {
            stream,
            timestamp,
            message: message.into(),
        }
    }

    /// The on-disk form: `<timestamp>: <message>` without the newline.
    pub fn line(&self) -> String {
        format!("{}: {}", format_timestamp(&self.timestamp), self.message)
    }
}

/// Render a wall-clock instant as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(ts: &OffsetDateTime) -> String {
    format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| ts.format(&format).ok())
        .unwrap_or_else(|| ts.to_string())
}

// ── Sensor readings ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSource {
    Light,
    Temperature,
}

impl SensorSource {
    /// Engineering value for a raw sample.
    ///
    /// Light is logged as the raw level; temperature goes through the
    /// linear sensor transfer function.
    pub fn convert(self, raw: u16) -> f64 {
        match self {
            Self::Light => f64::from(raw),
            Self::Temperature => celsius_from_raw(raw),
        }
    }

    /// Stream this source's records are written to.
    pub const fn stream(self) -> LogStream {
        match self {
            Self::Light => LogStream::Light,
            Self::Temperature => LogStream::Temperature,
        }
    }
}

/// One sample, created and consumed within a single sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub source: SensorSource,
    /// Range-normalised raw value in `[0, 1024)`.
    pub raw: u16,
    pub timestamp: OffsetDateTime,
}

impl SensorReading {
    pub fn value(&self) -> f64 {
        self.source.convert(self.raw)
    }

    /// Log message body for this reading.
    pub fn message(&self) -> String {
        match self.source {
            SensorSource::Light => format!("Light level {}", self.raw),
            SensorSource::Temperature => format!("Temperature: {}", self.value()),
        }
    }

    pub fn to_record(&self) -> LogRecord {
        LogRecord::new(self.source.stream(), self.timestamp, self.message())
    }
}

// ── Edge events ───────────────────────────────────────────────

/// A delivered edge on the monitored digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub port: u32,
    /// Input level observed when the edge fired (`false` = low).
    pub level: bool,
    pub timestamp: OffsetDateTime,
}

impl fmt::Display for EdgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pin={} State={} Time {}",
            self.port,
            u8::from(self.level),
            format_timestamp(&self.timestamp)
        )
    }
}
