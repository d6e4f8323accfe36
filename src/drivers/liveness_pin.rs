//! Liveness output pin.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO configured by hw_init.
//! On host/test: tracks the level in memory only.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::drivers::hw_init;

pub struct LivenessPin {
    gpio: i32,
    level: bool,
}

impl LivenessPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, level: false }
    }

    /// Last level driven onto the pin.
    pub fn level(&self) -> bool {
        self.level
    }

    fn drive(&mut self, high: bool) {
        hw_init::gpio_write(self.gpio, high);
        self.level = high;
    }
}

impl ErrorType for LivenessPin {
    type Error = Infallible;
}

impl OutputPin for LivenessPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}
