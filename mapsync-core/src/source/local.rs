//! The filesystem-backed library source.

use std::path::PathBuf;
use std::sync::Mutex;

use log::warn;

use mapsync_types::Beatmap;

use crate::scan::scan_library;
use crate::source::{BeatmapSource, IgnoreListener, RefreshListener, SourceState};

/// A library scanned from a root directory on disk.
pub struct LocalSource {
    root: Mutex<Option<PathBuf>>,
    state: SourceState,
}

impl LocalSource {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(None),
            state: SourceState::new(),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let source = Self::new();
        source.set_root(root);
        source
    }

    /// Point the source at a new root directory. Takes effect on the next
    /// refresh.
    pub fn set_root(&self, root: impl Into<PathBuf>) {
        *self.root.lock().unwrap() = Some(root.into());
    }

    pub fn root(&self) -> Option<PathBuf> {
        self.root.lock().unwrap().clone()
    }

    /// Wire serialization of the snapshot, done under the snapshot guard.
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        self.state.to_json()
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatmapSource for LocalSource {
    fn snapshot(&self) -> Option<Vec<Beatmap>> {
        self.state.snapshot()
    }

    /// Rescan the root directory. An unreadable or unset root replaces the
    /// snapshot with absent and returns false; refresh listeners fire
    /// either way.
    fn refresh(&self) -> bool {
        let root = self.root.lock().unwrap().clone();
        let scanned = match &root {
            Some(path) => match scan_library(path) {
                Ok(list) => Some(list),
                Err(e) => {
                    warn!("library scan of {} failed: {e}", path.display());
                    None
                }
            },
            None => None,
        };
        self.state.replace(scanned)
    }

    fn set_ignored(&self, index: usize, ignored: bool) {
        self.state.set_ignored(index, ignored);
    }

    fn on_refreshed(&self, listener: RefreshListener) {
        self.state.add_refresh_listener(listener);
    }

    fn on_ignore_changed(&self, listener: IgnoreListener) {
        self.state.add_ignore_listener(listener);
    }
}
