//! Filename pattern queries over the catalog, and subset export.

use crate::models::Catalog;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A compiled filename pattern, or the explicit "match everything" sentinel.
#[derive(Debug, Clone)]
pub enum FilenamePattern {
    MatchAll,
    Regex(Regex),
}

impl FilenamePattern {
    /// Compiles `pattern` case-insensitively. An empty string means match all.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(FilenamePattern::MatchAll);
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid filename pattern: {}", pattern))?;
        Ok(FilenamePattern::Regex(regex))
    }

    /// Alternation of several terms, e.g. `["kick", "bd"]` -> `(kick)|(bd)`.
    /// An empty list means match all.
    pub fn any_of(terms: &[&str]) -> Result<Self> {
        let parts: Vec<String> = terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| format!("({})", t))
            .collect();
        Self::parse(&parts.join("|"))
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, FilenamePattern::MatchAll)
    }

    /// Search (not full match) anywhere in the path string.
    pub fn matches(&self, filename: &Path) -> bool {
        match self {
            FilenamePattern::MatchAll => true,
            FilenamePattern::Regex(re) => re.is_match(&filename.to_string_lossy()),
        }
    }
}

/// What `MatchAll` does when metadata is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchAllPolicy {
    /// Return every filename, ignoring `metadata_is_necessary`.
    #[default]
    BypassMetadata,
    /// Apply the metadata filter like any other pattern.
    HonorMetadata,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Skip rows whose `has_metadata` is false.
    pub metadata_is_necessary: bool,
    pub match_all: MatchAllPolicy,
}

/// Filenames matching `pattern`, in catalog order.
pub fn find_patterns_in_filenames(
    catalog: &Catalog,
    pattern: &FilenamePattern,
    options: QueryOptions,
) -> Vec<PathBuf> {
    if pattern.is_match_all() && options.match_all == MatchAllPolicy::BypassMetadata {
        return catalog.filenames();
    }

    catalog
        .entries()
        .iter()
        .filter(|e| !options.metadata_is_necessary || e.has_metadata)
        .filter(|e| pattern.matches(e.filename()))
        .map(|e| e.filename().to_path_buf())
        .collect()
}

// ============================================================================
// Subset export
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct FilenameRow {
    #[serde(rename = "Filename")]
    filename: PathBuf,
}

/// Writes a single-column `Filename` CSV.
pub fn write_filename_list(path: &Path, files: &[PathBuf]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for f in files {
        writer.serialize(FilenameRow { filename: f.clone() })?;
    }
    // An empty list still gets its header row.
    if files.is_empty() {
        writer.write_record(["Filename"])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the `Filename` column of a CSV written by `write_filename_list`
/// (or a full catalog table).
pub fn read_filename_list(path: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut files = Vec::new();
    for row in reader.deserialize::<FilenameRow>() {
        let row = row.with_context(|| format!("Bad row in {}", path.display()))?;
        files.push(row.filename);
    }
    Ok(files)
}
