//! Sensor subsystem: ADC-backed analog channels.
//!
//! Each [`AdcChannel`] owns one ADC1 channel and normalises the 12-bit
//! converter output onto a configurable `[min, max)` range, which is what
//! the samplers see through the [`AnalogInput`] port.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from per-channel static atomics for injection.

pub mod temperature;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::AnalogInput;
use crate::app::records::RAW_RANGE_MAX;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Counts produced by the 12-bit converter.
const ADC_FULL_SCALE: u32 = 4096;

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; 2] = [AtomicU16::new(0), AtomicU16::new(0)];

/// Inject a raw 12-bit reading for a simulated ADC1 channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw12: u16) {
    if let Some(slot) = SIM_ADC.get(channel as usize) {
        slot.store(raw12.min((ADC_FULL_SCALE - 1) as u16), Ordering::Relaxed);
    }
}

/// Map a 12-bit converter count onto `[min, max)`.
pub fn normalize(raw12: u16, min: u16, max: u16) -> u16 {
    let span = u32::from(max.saturating_sub(min));
    let raw = u32::from(raw12).min(ADC_FULL_SCALE - 1);
    min + (raw * span / ADC_FULL_SCALE) as u16
}

/// One ADC1 channel exposed as a range-normalised analog input.
pub struct AdcChannel {
    channel: u32,
    min: u16,
    max: u16,
}

impl AdcChannel {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            min: 0,
            max: RAW_RANGE_MAX,
        }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_ADC
            .get(self.channel as usize)
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }
}

impl AnalogInput for AdcChannel {
    fn set_range(&mut self, min: u16, max: u16) {
        self.min = min;
        self.max = max.max(min);
    }

    fn read(&mut self) -> u16 {
        normalize(self.read_adc(), self.min, self.max)
    }
}
