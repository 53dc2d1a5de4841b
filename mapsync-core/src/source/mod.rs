//! Dual-variant beatmap sources: filesystem-backed local and peer-backed
//! remote, sharing one capability set and listener plumbing.

mod local;
mod remote;

pub use local::LocalSource;
pub use remote::{RemoteLink, RemoteSource};

use std::sync::Mutex;

use mapsync_types::Beatmap;

/// Callback fired when a source's snapshot is replaced wholesale.
pub type RefreshListener = Box<dyn FnMut() + Send>;
/// Callback fired when one beatmap's ignore flag changes: (index, new value).
pub type IgnoreListener = Box<dyn FnMut(usize, bool) + Send>;

/// The capability set shared by the local and remote library variants.
///
/// Listeners may fire on a network reader thread; anything that touches
/// caller-owned state must forward into a channel instead of acting
/// directly (see [`crate::events`]).
pub trait BeatmapSource: Send + Sync {
    /// Clone of the current snapshot. `None` means never loaded, or the
    /// last load failed.
    fn snapshot(&self) -> Option<Vec<Beatmap>>;

    /// Reload the snapshot and notify refresh listeners. Returns whether
    /// the refresh was carried out (local) or requested (remote).
    fn refresh(&self) -> bool;

    /// Set the ignore flag of the beatmap at `index`. Out-of-range indexes
    /// are stale instructions and are dropped; listeners fire only when
    /// the value actually changed.
    fn set_ignored(&self, index: usize, ignored: bool);

    /// Register a listener for wholesale snapshot replacement.
    fn on_refreshed(&self, listener: RefreshListener);

    /// Register a listener for ignore-flag changes.
    fn on_ignore_changed(&self, listener: IgnoreListener);
}

/// Shared snapshot and listener state for both variants.
pub(crate) struct SourceState {
    beatmaps: Mutex<Option<Vec<Beatmap>>>,
    refresh_listeners: Mutex<Vec<RefreshListener>>,
    ignore_listeners: Mutex<Vec<IgnoreListener>>,
}

impl SourceState {
    pub(crate) fn new() -> Self {
        Self {
            beatmaps: Mutex::new(None),
            refresh_listeners: Mutex::new(Vec::new()),
            ignore_listeners: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn snapshot(&self) -> Option<Vec<Beatmap>> {
        self.beatmaps.lock().unwrap().clone()
    }

    /// Replace the snapshot wholesale and notify refresh listeners.
    /// Returns whether the new snapshot is present.
    pub(crate) fn replace(&self, list: Option<Vec<Beatmap>>) -> bool {
        let loaded = list.is_some();
        *self.beatmaps.lock().unwrap() = list;
        self.notify_refreshed();
        loaded
    }

    pub(crate) fn set_ignored(&self, index: usize, ignored: bool) {
        // The snapshot lock is released before listeners run.
        let changed = {
            let mut guard = self.beatmaps.lock().unwrap();
            match guard.as_mut().and_then(|list| list.get_mut(index)) {
                Some(bm) if bm.ignored != ignored => {
                    bm.ignored = ignored;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.notify_ignored(index, ignored);
        }
    }

    /// Serialize the snapshot for the wire while holding the snapshot
    /// lock, so a concurrent toggle cannot produce a torn read. An absent
    /// snapshot serializes as `null`.
    pub(crate) fn to_json(&self) -> serde_json::Result<String> {
        let guard = self.beatmaps.lock().unwrap();
        serde_json::to_string(&*guard)
    }

    pub(crate) fn add_refresh_listener(&self, listener: RefreshListener) {
        self.refresh_listeners.lock().unwrap().push(listener);
    }

    pub(crate) fn add_ignore_listener(&self, listener: IgnoreListener) {
        self.ignore_listeners.lock().unwrap().push(listener);
    }

    fn notify_refreshed(&self) {
        for listener in self.refresh_listeners.lock().unwrap().iter_mut() {
            listener();
        }
    }

    fn notify_ignored(&self, index: usize, ignored: bool) {
        for listener in self.ignore_listeners.lock().unwrap().iter_mut() {
            listener(index, ignored);
        }
    }
}
