//! Falling-edge input driver.
//!
//! ## Hardware
//!
//! Input with internal pull-up, interrupt on falling edge. The ISR (see
//! `hw_init::init_isr_service`) disables the pin interrupt, samples the
//! level and raises the [`EdgeLatch`].  The interrupt is installed disabled;
//! [`EdgeInput::arm`] enables it once, and after each delivery it stays
//! disabled until [`EdgeInput::acknowledge`] re-enables it.
//!
//! ## Simulation
//!
//! On host, a [`SimEdgeTrigger`] stands in for the wire: `fall()` behaves
//! like the ISR, including the disarm, so tests can observe a handler that
//! fails to acknowledge.

#[cfg(not(target_os = "espidf"))]
use std::sync::Arc;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::edge::EdgeLatch;
use crate::app::ports::EdgeInput;
use crate::drivers::hw_init::{self, HwInitError};
use crate::pins;

pub struct EdgeInputPin {
    gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    armed: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    latch: &'static EdgeLatch,
}

impl EdgeInputPin {
    /// Register the ISR for [`pins::EDGE_GPIO`], leaving it disarmed.
    pub fn attach(latch: &'static EdgeLatch) -> Result<Self, HwInitError> {
        hw_init::init_isr_service(latch)?;
        Ok(Self {
            gpio: pins::EDGE_GPIO,
            #[cfg(not(target_os = "espidf"))]
            armed: Arc::new(AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            latch,
        })
    }

    /// Current pin level (`true` = high / idle).
    pub fn level(&self) -> bool {
        hw_init::gpio_read(self.gpio)
    }

    /// Handle for injecting edges in simulation.
    #[cfg(not(target_os = "espidf"))]
    pub fn trigger(&self) -> SimEdgeTrigger {
        SimEdgeTrigger {
            armed: self.armed.clone(),
            latch: self.latch,
        }
    }
}

impl EdgeInput for EdgeInputPin {
    fn port(&self) -> u32 {
        self.gpio as u32
    }

    #[cfg(target_os = "espidf")]
    fn arm(&mut self) {
        hw_init::gpio_arm(self.gpio);
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm(&mut self) {
        self.armed.store(true, Ordering::Release);
    }

    fn acknowledge(&mut self) {
        self.arm();
    }
}

/// Simulated wire attached to an [`EdgeInputPin`].
#[cfg(not(target_os = "espidf"))]
#[derive(Clone)]
pub struct SimEdgeTrigger {
    armed: Arc<AtomicBool>,
    latch: &'static EdgeLatch,
}

#[cfg(not(target_os = "espidf"))]
impl SimEdgeTrigger {
    /// Drive a falling edge.  Returns `false` if the input was disarmed and
    /// the edge was lost.
    pub fn fall(&self) -> bool {
        if !self.armed.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.latch.raise(false);
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}
