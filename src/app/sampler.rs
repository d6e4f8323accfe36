//! Periodic sensor sampler.
//!
//! One [`PeriodicSampler`] per sensor.  Each firing reads the input,
//! converts the raw value and hands exactly one record to the sink.  A
//! firing has no failure path: the read is best effort and the sink
//! swallows its own faults, so the next firing always happens.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::ports::{AnalogInput, Clock, RecordSink};
use super::records::{SensorReading, SensorSource};

/// What a sampler measures and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSpec {
    pub source: SensorSource,
    pub period: Duration,
}

impl SamplerSpec {
    pub const fn light(period: Duration) -> Self {
        Self {
            source: SensorSource::Light,
            period,
        }
    }

    pub const fn temperature(period: Duration) -> Self {
        Self {
            source: SensorSource::Temperature,
            period,
        }
    }

    /// Scheduler label.
    pub const fn label(&self) -> &'static str {
        match self.source {
            SensorSource::Light => "light",
            SensorSource::Temperature => "temperature",
        }
    }
}

pub struct PeriodicSampler<A: AnalogInput> {
    spec: SamplerSpec,
    input: A,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn RecordSink>,
}

impl<A: AnalogInput> PeriodicSampler<A> {
    pub fn new(spec: SamplerSpec, input: A, clock: Arc<dyn Clock>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            spec,
            input,
            clock,
            sink,
        }
    }

    pub fn spec(&self) -> SamplerSpec {
        self.spec
    }

    /// Run one sampling cycle and return the reading that was logged.
    pub fn fire(&mut self) -> SensorReading {
        let reading = SensorReading {
            source: self.spec.source,
            raw: self.input.read(),
            timestamp: self.clock.now(),
        };

        match reading.source {
            SensorSource::Light => debug!("Light: {}", reading.raw),
            SensorSource::Temperature => debug!("Temp: {}", reading.value()),
        }

        self.sink.append(&reading.to_record());
        reading
    }
}
