//! Filesystem scanning for beatmap directories.
//!
//! A beatmap lives in a directory named `<id> <name>` directly under the
//! library root, e.g. `22374 name - map`.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use mapsync_types::Beatmap;

/// Directory name format: one or more digits, a space, then the name.
fn dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+) (.*)$").expect("valid pattern"))
}

/// Scan `root` for beatmap directories and return them sorted ascending
/// by id. A readable root with no matching subdirectories yields an empty
/// list; an unreadable root is an error.
pub fn scan_library(root: &Path) -> io::Result<Vec<Beatmap>> {
    let mut maps = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(caps) = dir_pattern().captures(name) else {
            continue;
        };
        let id = match caps[1].parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                warn!("skipping {:?}: id prefix out of range", name);
                continue;
            }
        };
        maps.push(Beatmap::new(id, &caps[2]));
    }

    maps.sort_by_key(|b| b.id);
    Ok(maps)
}
