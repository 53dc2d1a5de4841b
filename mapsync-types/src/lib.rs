//! # mapsync-types
//!
//! Shared type definitions for the mapsync ecosystem.
//! This crate contains data structures used across mapsync-core and
//! mapsync-net.

use serde::{Deserialize, Serialize};

/// One synchronizable library item: a numeric id, a display name, and a
/// per-library ignore flag.
///
/// Libraries order beatmaps ascending by `id`; the name carries whatever
/// the on-disk directory said, including quotes, braces and backslashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: u32,
    pub name: String,
    #[serde(rename = "ignore")]
    pub ignored: bool,
}

impl Beatmap {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ignored: false,
        }
    }
}

impl std::fmt::Display for Beatmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// Which side of the peer link a source or event refers to, always from
/// the perspective of the process naming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Local,
    Remote,
}
