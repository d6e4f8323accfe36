//! Application core: node behaviour with no direct I/O.
//!
//! Sampling, the liveness pulse, edge handling and the boot sequence.
//! All interaction with hardware, storage and the network happens through
//! the **port traits** in [`ports`], so every component runs on the host
//! under test.

pub mod boot;
pub mod edge;
pub mod liveness;
pub mod ports;
pub mod records;
pub mod sampler;
