//! Edge event handling.
//!
//! ```text
//! ┌─────────────┐ raise(level) ┌────────────┐ wait().await ┌──────────────────┐
//! │ GPIO ISR    │─────────────▶│ EdgeLatch  │─────────────▶│ EdgeEventHandler │
//! │ (disarms)   │              │ (Signal)   │              │ trace + ack      │
//! └─────────────┘              └────────────┘              └────────┬─────────┘
//!        ▲                                                          │
//!        └──────────────── EdgeInput::acknowledge() ────────────────┘
//! ```
//!
//! The interrupt side disarms the input when it fires.  Only the handler's
//! acknowledge re-arms it, so a handler that forgets to acknowledge starves
//! every later edge.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::info;

use super::ports::{Clock, EdgeInput};
use super::records::EdgeEvent;

/// Hand-off point between the interrupt and the handler task.
///
/// Holds at most one pending edge; `raise` is safe from interrupt context.
pub struct EdgeLatch {
    signal: Signal<CriticalSectionRawMutex, bool>,
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Publish an edge with the level observed at interrupt time.
    pub fn raise(&self, level: bool) {
        self.signal.signal(level);
    }

    /// Wait for the next published edge.
    pub async fn wait(&self) -> bool {
        self.signal.wait().await
    }

    /// Take a pending edge without waiting.
    pub fn try_take(&self) -> Option<bool> {
        self.signal.try_take()
    }

    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }

    /// Drop any pending edge.
    pub fn clear(&self) {
        self.signal.reset();
    }
}

/// Records every delivered edge and re-arms the input.
pub struct EdgeEventHandler {
    clock: Arc<dyn Clock>,
    handled: u32,
}

impl EdgeEventHandler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, handled: 0 }
    }

    /// Handle one delivered edge.  Acknowledges the input exactly once.
    pub fn handle(&mut self, level: bool, input: &mut dyn EdgeInput) -> EdgeEvent {
        let event = EdgeEvent {
            port: input.port(),
            level,
            timestamp: self.clock.now(),
        };
        info!("{}", event);
        self.handled = self.handled.wrapping_add(1);
        input.acknowledge();
        event
    }

    /// Edges handled since construction.
    pub fn handled(&self) -> u32 {
        self.handled
    }
}
