//! The peer-backed library source.

use std::sync::{Mutex, Weak};

use mapsync_types::Beatmap;

use crate::source::{BeatmapSource, IgnoreListener, RefreshListener, SourceState};

/// Connection-layer capabilities the remote source needs: a liveness query
/// and a way to ask the peer for its list.
pub trait RemoteLink: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Ask the peer to send its current library snapshot.
    fn request_list(&self);
}

/// The peer's library as last reported over the wire.
pub struct RemoteSource {
    link: Mutex<Option<Weak<dyn RemoteLink>>>,
    state: SourceState,
}

impl RemoteSource {
    pub fn new() -> Self {
        Self {
            link: Mutex::new(None),
            state: SourceState::new(),
        }
    }

    /// Attach the connection layer. The sources are built before the
    /// network manager, so this is wired afterwards.
    pub fn attach_link(&self, link: Weak<dyn RemoteLink>) {
        *self.link.lock().unwrap() = Some(link);
    }

    /// Replace the snapshot with a list received from the peer. `None`
    /// mirrors a peer whose own snapshot is absent.
    pub fn replace_all(&self, beatmaps: Option<Vec<Beatmap>>) {
        self.state.replace(beatmaps);
    }
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatmapSource for RemoteSource {
    fn snapshot(&self) -> Option<Vec<Beatmap>> {
        self.state.snapshot()
    }

    /// Request a fresh list from the peer. Returns false immediately when
    /// no link is attached or the link is down; the snapshot itself is
    /// replaced later, when the answer arrives.
    fn refresh(&self) -> bool {
        let link = self.link.lock().unwrap().as_ref().and_then(Weak::upgrade);
        match link {
            Some(link) if link.is_connected() => {
                link.request_list();
                true
            }
            _ => false,
        }
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
