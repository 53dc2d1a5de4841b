//! Persisted user settings.
//!
//! A small TOML file under the user's config directory remembering the
//! library root and the last peer address, so the front-end doesn't have
//! to ask again on every launch.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings the front-end persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory holding the beatmap folders.
    pub songs_dir: Option<PathBuf>,
    /// Peer address last used for an outbound connection.
    pub remote_address: Option<String>,
}

impl Settings {
    /// Load saved settings, falling back to defaults when the file is
    /// absent or malformed.
    pub fn load() -> Self {
        let Some(path) = settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!(target: "config", "ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(target: "config", "could not read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the settings out, creating the config directory if needed.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = settings_path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, contents)
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mapsync").join("config.toml"))
}
