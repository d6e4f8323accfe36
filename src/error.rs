//! Unified error types for the SdLogger firmware.
//!
//! Only the boot path can fail in a way the caller sees.  Steady-state
//! tasks never return errors: the storage sink swallows its own faults and
//! sensor reads are best effort.  All variants are `Copy` so they can be
//! logged and returned without allocation.

use core::fmt;

use crate::app::ports::{NetError, TimeSyncError};

/// Every fallible boot step funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Interface enumeration or DHCP control failed.
    Network(NetError),
    /// Network time could not be fetched or applied.
    TimeSync(TimeSyncError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration failed validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "network: {e}"),
            Self::TimeSync(e) => write!(f, "time sync: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<NetError> for Error {
    fn from(e: NetError) -> Self {
        Self::Network(e)
    }
}

impl From<TimeSyncError> for Error {
    fn from(e: TimeSyncError) -> Self {
        Self::TimeSync(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
