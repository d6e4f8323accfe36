//! Storage log sink adapter.
//!
//! Implements [`RecordSink`] by appending one text line per record to a
//! file on the removable volume.  Every call is self-contained:
//!
//! ```text
//! volume present? ──no──▶ drop (no file touched)
//!       │yes
//!       ▼
//! lock ▶ open(append|create) ▶ write line ▶ flush+sync ▶ close ▶ unlock
//! ```
//!
//! No handle survives between calls, so a card pulled mid-run loses at most
//! the line being written.  Faults anywhere in the chain are swallowed; the
//! only trace they leave is a gap in the log and the `dropped` counter.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::app::ports::{RecordSink, VolumePort};
use crate::app::records::{LogRecord, LogStream};
use crate::config::NodeConfig;

/// Best-effort append-only writer for the node's log streams.
pub struct StorageLogSink<V: VolumePort> {
    volumes: V,
    volume_name: String,
    system_file: String,
    light_file: String,
    temperature_file: String,
    /// Serialises open-through-close across tasks.
    guard: Mutex<()>,
    written: AtomicU32,
    dropped: AtomicU32,
}

impl<V: VolumePort> StorageLogSink<V> {
    pub fn new(volumes: V, config: &NodeConfig) -> Self {
        Self {
            volumes,
            volume_name: config.volume_name.clone(),
            system_file: config.stream_file(LogStream::System).to_owned(),
            light_file: config.stream_file(LogStream::Light).to_owned(),
            temperature_file: config.stream_file(LogStream::Temperature).to_owned(),
            guard: Mutex::new(()),
            written: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Records appended successfully since construction.
    pub fn written(&self) -> u32 {
        self.written.load(Ordering::Relaxed)
    }

    /// Records lost to an absent volume or an I/O fault.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn volumes(&self) -> &V {
        &self.volumes
    }

    fn file_name(&self, stream: LogStream) -> &str {
        match stream {
            LogStream::System => &self.system_file,
            LogStream::Light => &self.light_file,
            LogStream::Temperature => &self.temperature_file,
        }
    }
}

/// Open (creating if needed), append one line, flush, close.
///
/// The handle is dropped on every path out of this function.
fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())?;
    file.flush()?;
    file.sync_all()
}

impl<V: VolumePort> RecordSink for StorageLogSink<V> {
    fn append(&self, record: &LogRecord) {
        let Some(root) = self.volumes.find(&self.volume_name) else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                "LOG | volume '{}' absent, dropped {} record",
                self.volume_name, record.stream
            );
            return;
        };

        let path = root.join(self.file_name(record.stream));
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        match append_line(&path, &record.line()) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("LOG | write to {} failed ({}), record dropped", path.display(), e);
            }
        }
    }
}
