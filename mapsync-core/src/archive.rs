//! Packaging beatmap directories into nested zip archives.
//!
//! Each beatmap directory becomes one `.osz` archive; all of them are then
//! bundled into a single `Missing-<timestamp>.zip` next to the library.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use mapsync_types::Beatmap;

/// Failure while writing the outer archive. Per-item failures are skipped,
/// not surfaced here.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("zip write error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Package the given beatmaps' directories under `root` into one outer
/// archive at `root`, returning its path.
///
/// Per-item archives are staged in a temporary directory that is removed
/// when this returns, on success and failure alike. A beatmap without a
/// matching directory is skipped with a warning. An empty list still
/// produces a valid, empty outer archive.
pub fn package_missing(root: &Path, beatmaps: &[Beatmap]) -> Result<PathBuf, ArchiveError> {
    let staging = tempfile::tempdir()?;
    let stamp = Local::now().format("%m%d%y-%I%M%S");
    let out_path = root.join(format!("Missing-{stamp}.zip"));

    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut outer = ZipWriter::new(File::create(&out_path)?);

    for bm in beatmaps {
        let dir = root.join(format!("{} {}", bm.id, bm.name));
        if !dir.is_dir() {
            warn!("no directory for beatmap {bm}, skipping");
            continue;
        }

        let item_name = format!("{} {}.osz", bm.id, bm.name);
        let item_path = staging.path().join(&item_name);
        if let Err(e) = pack_item(&dir, &item_path, options) {
            warn!("failed to pack {}: {e}", dir.display());
            continue;
        }

        outer.start_file(item_name.as_str(), options)?;
        let mut item = File::open(&item_path)?;
        io::copy(&mut item, &mut outer)?;
        info!("added {bm}");
    }

    outer.finish()?;
    Ok(out_path)
}

/// Zip one beatmap directory's full file tree into `out`.
fn pack_item(dir: &Path, out: &Path, options: FileOptions) -> Result<(), ArchiveError> {
    let mut writer = ZipWriter::new(File::create(out)?);
    let mut stack = vec![dir.to_path_buf()];
    let mut buffer = Vec::new();

    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            let rel = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            if path.is_dir() {
                writer.add_directory(format!("{rel}/"), options)?;
                stack.push(path);
            } else {
                writer.start_file(rel, options)?;
                let mut f = File::open(&path)?;
                f.read_to_end(&mut buffer)?;
                writer.write_all(&buffer)?;
                buffer.clear();
            }
        }
    }

    writer.finish()?;
    Ok(())
}
