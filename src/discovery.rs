//! Recursive discovery of candidate audio files.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Audio files are recognised by this exact (case-sensitive) suffix.
pub const WAV_EXTENSION: &str = ".wav";

/// Walks `root` and returns every `.wav` file beneath it.
///
/// Entries within a directory are visited in file-name order, so two runs
/// over an unchanged tree return the same list. Unreadable entries are
/// skipped the way the walk reports them; nothing here creates or touches
/// files.
pub fn discover_wav_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
    {
        // Symlinks to directories are not descended into and are not files.
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }
        if is_wav_name(entry.file_name().to_string_lossy().as_ref()) {
            files.push(entry.into_path());
        }
    }

    files
}

fn is_wav_name(name: &str) -> bool {
    name.ends_with(WAV_EXTENSION)
}
