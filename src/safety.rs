//! Safety utilities to prevent accidental overwrites.
//!
//! Query exports and catalog saves are plain CSV files, so it is easy to
//! point `--export` at the catalog the query was read from. These checks
//! refuse that before anything is written.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

fn normalized(p: &Path) -> PathBuf {
    // Existing files compare by canonical path; new files by parent + name.
    if let Ok(c) = p.canonicalize() {
        return c;
    }
    match (p.parent(), p.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map(|d| d.join(name))
            .unwrap_or_else(|_| p.to_path_buf()),
        _ => std::env::current_dir()
            .map(|d| d.join(p))
            .unwrap_or_else(|_| p.to_path_buf()),
    }
}

/// Validates that an output path is safe to (over)write.
///
/// Checks:
/// - Output must not be one of the provided source paths
/// - Output must not be an audio file
///
/// # Arguments
/// * `output` - The path that will be created/overwritten
/// * `source_paths` - Paths that were read in this run and must survive
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let out = normalized(output);

    for source in source_paths {
        if out == normalized(source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    let is_audio = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_audio {
        bail!(
            "Safety check failed: output '{}' looks like an audio file",
            output.display()
        );
    }

    Ok(())
}
