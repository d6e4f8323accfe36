//! Wall-clock adapter.
//!
//! Provides the node's [`Clock`].
//!
//! - **`target_os = "espidf"`**: reads and writes the system clock
//!   (`settimeofday()`), so ESP-IDF's own log timestamps follow the
//!   synchronised time too.
//! - **`not(target_os = "espidf")`**: keeps an offset over the host clock;
//!   the host's real time is never touched.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI64, Ordering};

use time::OffsetDateTime;

use crate::app::ports::{Clock, TimeSyncError};

/// Unix timestamp of 2020-01-01; anything earlier means the clock was never set.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    offset_ns: AtomicI64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            offset_ns: AtomicI64::new(0),
        }
    }

    /// `false` until the clock has been set to a plausible date.
    pub fn is_synced(&self) -> bool {
        self.now().unix_timestamp() >= EPOCH_2020
    }
}

#[cfg(target_os = "espidf")]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn set(&self, now: OffsetDateTime) -> Result<(), TimeSyncError> {
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: now.unix_timestamp() as _,
            tv_usec: (now.nanosecond() / 1_000) as _,
        };
        // SAFETY: settimeofday only reads the timeval; a null timezone is allowed.
        let ret = unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) };
        if ret != 0 {
            return Err(TimeSyncError::ClockRejected);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let offset = time::Duration::nanoseconds(self.offset_ns.load(Ordering::Acquire));
        OffsetDateTime::now_utc() + offset
    }

    fn set(&self, now: OffsetDateTime) -> Result<(), TimeSyncError> {
        let offset = (now - OffsetDateTime::now_utc()).whole_nanoseconds();
        let offset = i64::try_from(offset).map_err(|_| TimeSyncError::ClockRejected)?;
        self.offset_ns.store(offset, Ordering::Release);
        Ok(())
    }
}
