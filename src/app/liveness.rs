//! Liveness pulse: a heartbeat output flipped on every firing.

use embedded_hal::digital::{OutputPin, PinState};

/// Owns the heartbeat pin and its last driven state.
pub struct LivenessPulse<P: OutputPin> {
    pin: P,
    state: bool,
}

impl<P: OutputPin> LivenessPulse<P> {
    /// Starts low; the first pulse drives the pin high.
    pub fn new(pin: P) -> Self {
        Self { pin, state: false }
    }

    /// Flip the state and drive it onto the pin.  Returns the new state.
    pub fn pulse(&mut self) -> bool {
        self.state = !self.state;
        let _ = self.pin.set_state(PinState::from(self.state));
        self.state
    }

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
