//! SdLogger node firmware library.
//!
//! Exposes the node's modules for integration testing. All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module, so
//! the library builds and tests on the host with `--no-default-features`.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
