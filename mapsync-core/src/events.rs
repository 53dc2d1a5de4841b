//! Hand-off queue from background threads into the caller's own thread.
//!
//! Source listeners may fire on the network reader thread. Caller-owned
//! state must never be touched there; [`forward_events`] registers
//! listeners that do nothing but push into a channel, which the caller
//! drains on its own thread.

use std::sync::mpsc::Sender;

use mapsync_types::SourceKind;

use crate::source::BeatmapSource;

/// Notification delivered to the caller's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A source's snapshot was replaced wholesale.
    ListReplaced(SourceKind),
    /// One beatmap's ignore flag changed.
    IgnoreChanged {
        source: SourceKind,
        index: usize,
        ignored: bool,
    },
}

/// Register listeners on `source` that forward its notifications into
/// `events`, tagged with `kind`. Send failures mean the caller went away
/// and are ignored.
pub fn forward_events(source: &dyn BeatmapSource, kind: SourceKind, events: Sender<SyncEvent>) {
    let refresh_tx = events.clone();
    source.on_refreshed(Box::new(move || {
        let _ = refresh_tx.send(SyncEvent::ListReplaced(kind));
    }));
    source.on_ignore_changed(Box::new(move |index, ignored| {
        let _ = events.send(SyncEvent::IgnoreChanged {
            source: kind,
            index,
            ignored,
        });
    }));
}
