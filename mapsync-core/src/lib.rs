//! # mapsync-core
//!
//! Core library for synchronizing beatmap collections between two peers.
//!
//! This crate provides everything except the wire transport:
//! - [`scan`] - filesystem scanning of a beatmap root directory
//! - [`diff`] - sorted-merge set difference between two libraries
//! - [`archive`] - packaging missing beatmaps into nested zip archives
//! - [`source`] - the local (filesystem) and remote (peer) library sources
//! - [`events`] - the hand-off queue from background threads to the caller
//! - [`config`] - persisted user settings

pub mod archive;
pub mod config;
pub mod diff;
pub mod events;
pub mod scan;
pub mod source;

pub use archive::{package_missing, ArchiveError};
pub use config::Settings;
pub use diff::missing;
pub use events::{forward_events, SyncEvent};
pub use scan::scan_library;
pub use source::{
    BeatmapSource, IgnoreListener, LocalSource, RefreshListener, RemoteLink, RemoteSource,
};
