//! Existence and decodability checks for candidate audio files.

use crate::audio;
use crate::error::ItemError;
use crate::models::Catalog;
use crate::progress::{Phase, PhaseProgress};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Outcome of validating a candidate list.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Valid paths, in input order.
    pub valid: Vec<PathBuf>,
    /// Rejected paths with the reason, in input order.
    pub rejected: Vec<(PathBuf, ItemError)>,
}

/// Succeeds iff `path` is a regular file whose header parses as WAV.
pub fn validate_file(path: &Path) -> Result<(), ItemError> {
    audio::probe(path).map(|_| ())
}

/// Filters `paths` down to the decodable ones without reordering.
///
/// Each check is independent, so they run on the rayon pool; results are
/// collected back in input order.
pub fn validate_paths(paths: &[PathBuf]) -> ValidationReport {
    let progress = PhaseProgress::start(Phase::Validation, paths.len() as u64);

    let outcomes: Vec<Result<(), ItemError>> = paths
        .par_iter()
        .map(|p| {
            let r = validate_file(p);
            progress.inc();
            r
        })
        .collect();

    let mut report = ValidationReport::default();
    for (path, outcome) in paths.iter().zip(outcomes) {
        match outcome {
            Ok(()) => report.valid.push(path.clone()),
            Err(e) => {
                warn!("{}", e);
                report.rejected.push((path.clone(), e));
            }
        }
    }

    progress.finish(format!(
        "Validated {} files ({} rejected)",
        report.valid.len(),
        report.rejected.len()
    ));
    report
}

/// Validates `paths` and builds a fresh catalog from the survivors.
///
/// This is the whole-table replacement: the returned catalog has one
/// entry per valid path and no artifact fields set.
pub fn validate_into_catalog(paths: &[PathBuf]) -> (Catalog, ValidationReport) {
    let report = validate_paths(paths);
    let catalog = Catalog::from_filenames(report.valid.iter().cloned());
    (catalog, report)
}
