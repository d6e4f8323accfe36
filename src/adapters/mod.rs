//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                      |
//! |------------|--------------|----------------------------------|
//! | `log_sink` | RecordSink   | Log files on the storage volume  |
//! | `netif`    | NetworkPort  | ESP-IDF netif / simulated stack  |
//! | `sntp`     | TimeSource   | SNTP server over UDP             |
//! | `time`     | Clock        | System wall clock                |
//! | `volume`   | VolumePort   | VFS mount points                 |

pub mod log_sink;
pub mod netif;
pub mod sntp;
pub mod time;
pub mod volume;
