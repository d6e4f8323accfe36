//! Mount-table volume adapter.
//!
//! Implements [`VolumePort`] over a fixed table of `(name, mount point)`
//! pairs.  A volume counts as mounted only while its mount point can be
//! listed, which is re-checked on every query:
//!
//! - **`target_os = "espidf"`**: the FAT VFS mount point (e.g. `/sdcard`)
//!   only lists while the card is mounted and readable.
//! - **host**: any directory; tests create and delete it to simulate card
//!   insertion and removal.
//!
//! [`MountSlot`] owns the mount itself and retries it, so a card inserted
//! after boot becomes visible to the table.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::app::ports::{VolumeInfo, VolumePort};

const MAX_MOUNTS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct MountTable {
    mounts: heapless::Vec<VolumeInfo, MAX_MOUNTS>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a volume.  Returns `false` if the name is too long or the
    /// table is full.
    pub fn add(&mut self, name: &str, mount_point: impl Into<PathBuf>) -> bool {
        let mut n = heapless::String::new();
        if n.push_str(name).is_err() {
            warn!("Volumes: name '{}' too long, not registered", name);
            return false;
        }
        let entry = VolumeInfo {
            name: n,
            root: mount_point.into(),
        };
        if self.mounts.push(entry).is_err() {
            warn!("Volumes: table full, '{}' not registered", name);
            return false;
        }
        true
    }

    /// Builder form of [`add`](Self::add).
    pub fn with_mount(mut self, name: &str, mount_point: impl Into<PathBuf>) -> Self {
        self.add(name, mount_point);
        self
    }
}

impl VolumePort for MountTable {
    fn mounted(&self) -> Vec<VolumeInfo> {
        self.mounts
            .iter()
            .filter(|v| fs::read_dir(&v.root).is_ok())
            .cloned()
            .collect()
    }
}

/// Holds the mount of one removable volume and re-establishes it.
///
/// `mount` is any fallible constructor whose value keeps the volume mounted
/// while alive (on target, the FAT VFS registration).
pub struct MountSlot<M, F> {
    root: PathBuf,
    mount: F,
    current: Option<M>,
}

impl<M, E, F> MountSlot<M, F>
where
    E: fmt::Display,
    F: FnMut() -> Result<M, E>,
{
    pub fn new(root: impl Into<PathBuf>, mount: F) -> Self {
        Self {
            root: root.into(),
            mount,
            current: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.current.is_some()
    }

    /// Release a mount whose root stopped listing, then mount if empty.
    /// Returns whether the volume is mounted afterwards.
    pub fn poll(&mut self) -> bool {
        if self.current.is_some() && fs::read_dir(&self.root).is_err() {
            warn!("Volumes: {} unreadable, releasing mount", self.root.display());
            self.current = None;
        }
        if self.current.is_none() {
            match (self.mount)() {
                Ok(m) => {
                    info!("Volumes: mounted at {}", self.root.display());
                    self.current = Some(m);
                }
                Err(e) => debug!("Volumes: mount at {} failed: {}", self.root.display(), e),
            }
        }
        self.current.is_some()
    }
}
