//! GPIO drivers, hardware initialisation, and thread helpers.

pub mod edge_input;
pub mod hw_init;
pub mod liveness_pin;
pub mod task_pin;
