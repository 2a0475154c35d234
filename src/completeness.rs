//! Metadata completeness check.
//!
//! For each audio file, looks for the three sibling analysis artifacts and
//! records the ones it finds. Completeness is decided per pass: a file is
//! complete only if all three artifacts were found during *this* pass, even
//! if an earlier pass recorded a path that has since disappeared.

use crate::audio::sibling_path;
use crate::error::ItemError;
use crate::models::{ArtifactKind, Catalog};
use crate::progress::{Phase, PhaseProgress};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Expected location of `kind`'s artifact for an audio file.
pub fn artifact_path(audio: &Path, kind: ArtifactKind) -> PathBuf {
    sibling_path(audio, kind.subdir(), kind.suffix())
}

/// Per-file result of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct FileCompleteness {
    pub filename: PathBuf,
    /// Artifacts found this pass (0..=3).
    pub found: usize,
    pub complete: bool,
}

#[derive(Debug, Default)]
pub struct CompletenessReport {
    /// One row per checked file, in catalog row order.
    pub files: Vec<FileCompleteness>,
    /// Every artifact that was looked for and not found.
    pub missing: Vec<ItemError>,
    /// Requested filenames that have no row in the catalog.
    pub unknown: Vec<PathBuf>,
}

impl CompletenessReport {
    pub fn complete_count(&self) -> usize {
        self.files.iter().filter(|f| f.complete).count()
    }
}

/// Looks up all three artifacts for one file. Read-only.
fn probe_artifacts(audio: &Path) -> [Option<PathBuf>; 3] {
    ArtifactKind::ALL.map(|kind| {
        let p = artifact_path(audio, kind);
        if p.is_file() {
            Some(p)
        } else {
            None
        }
    })
}

/// Runs one completeness pass over `filenames` (default: every row).
///
/// Found artifact paths are written onto the row; missing ones leave the
/// row's previous value in place. `has_metadata` is overwritten for every
/// checked row.
pub fn check_metadata(catalog: &mut Catalog, filenames: Option<&[PathBuf]>) -> CompletenessReport {
    let mut report = CompletenessReport::default();

    // Resolve the requested set to row positions, sorted into row order.
    let mut rows: Vec<usize> = match filenames {
        None => (0..catalog.len()).collect(),
        Some(list) => {
            let mut rows = Vec::with_capacity(list.len());
            for f in list {
                match catalog.position(f) {
                    Some(i) => rows.push(i),
                    None => {
                        warn!("Not in catalog, skipping metadata check: {}", f.display());
                        report.unknown.push(f.clone());
                    }
                }
            }
            rows
        }
    };
    rows.sort_unstable();
    rows.dedup();

    let targets: Vec<PathBuf> = rows
        .iter()
        .map(|&i| catalog.entries()[i].filename().to_path_buf())
        .collect();

    let progress = PhaseProgress::start(Phase::Metadata, targets.len() as u64);
    let found: Vec<[Option<PathBuf>; 3]> = targets
        .par_iter()
        .map(|f| {
            let r = probe_artifacts(f);
            progress.inc();
            r
        })
        .collect();
    progress.finish_and_clear();

    for (filename, artifacts) in targets.into_iter().zip(found) {
        let mut count = 0;
        if let Some(entry) = catalog.get_mut(&filename) {
            for (kind, artifact) in ArtifactKind::ALL.into_iter().zip(artifacts) {
                match artifact {
                    Some(p) => {
                        entry.set_artifact(kind, p);
                        count += 1;
                    }
                    None => {
                        let missing = ItemError::MissingArtifact(artifact_path(&filename, kind));
                        debug!("{}", missing);
                        report.missing.push(missing);
                    }
                }
            }
            entry.has_metadata = count == ArtifactKind::ALL.len();
        }
        report.files.push(FileCompleteness {
            complete: count == ArtifactKind::ALL.len(),
            filename,
            found: count,
        });
    }

    catalog.completeness_checked = true;
    report
}
