//! Core data models for the sample catalog.
//!
//! This module contains the catalog table, its rows, and the fixed set of
//! analysis artifact kinds tracked per audio file.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Type Aliases
// ============================================================================

/// Index mapping filename to row position in `Catalog::entries`
pub type FilenameIndex = FxHashMap<PathBuf, usize>;

// ============================================================================
// Artifact Kinds
// ============================================================================

/// The three independently produced analysis artifacts.
///
/// Each lives in a fixed subdirectory next to the audio file and is named
/// after the audio file's stem plus a kind-specific suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    AudioCommons,
    Chroma,
    PitchTimbre,
}

impl ArtifactKind {
    /// All kinds, in the order they are checked and persisted.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::AudioCommons,
        ArtifactKind::Chroma,
        ArtifactKind::PitchTimbre,
    ];

    pub fn subdir(self) -> &'static str {
        match self {
            ArtifactKind::AudioCommons => "audiocommons",
            ArtifactKind::Chroma => "chroma_analysis",
            ArtifactKind::PitchTimbre => "pt_analysis",
        }
    }

    /// Replaces the `.wav` extension: `<stem><suffix>`.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::AudioCommons => "_analysis.json",
            ArtifactKind::Chroma => "_chroma.json",
            ArtifactKind::PitchTimbre => "_pytimbre.json",
        }
    }

    /// Column header in the persisted catalog.
    pub fn column(self) -> &'static str {
        match self {
            ArtifactKind::AudioCommons => "AudioCommons_Metadata",
            ArtifactKind::Chroma => "Chroma_Metadata",
            ArtifactKind::PitchTimbre => "PT_Metadata",
        }
    }
}

// ============================================================================
// Catalog Rows
// ============================================================================

/// One row per audio file.
///
/// `has_metadata` is only as fresh as the last completeness pass; callers
/// re-run the check after artifacts change on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    filename: PathBuf,
    pub audio_commons_metadata_path: Option<PathBuf>,
    pub chroma_metadata_path: Option<PathBuf>,
    pub pt_metadata_path: Option<PathBuf>,
    pub has_metadata: bool,
}

impl CatalogEntry {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            audio_commons_metadata_path: None,
            chroma_metadata_path: None,
            pt_metadata_path: None,
            has_metadata: false,
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::AudioCommons => self.audio_commons_metadata_path.as_deref(),
            ArtifactKind::Chroma => self.chroma_metadata_path.as_deref(),
            ArtifactKind::PitchTimbre => self.pt_metadata_path.as_deref(),
        }
    }

    pub fn set_artifact(&mut self, kind: ArtifactKind, path: PathBuf) {
        let slot = match kind {
            ArtifactKind::AudioCommons => &mut self.audio_commons_metadata_path,
            ArtifactKind::Chroma => &mut self.chroma_metadata_path,
            ArtifactKind::PitchTimbre => &mut self.pt_metadata_path,
        };
        *slot = Some(path);
    }

    pub fn has_any_artifact(&self) -> bool {
        ArtifactKind::ALL.iter().any(|&k| self.artifact(k).is_some())
    }
}

// ============================================================================
// Catalog Table
// ============================================================================

/// Ordered table of entries keyed by filename.
///
/// Row order is insertion order (discovery order). Filenames are unique;
/// rows are only ever replaced wholesale, never removed one at a time.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: FilenameIndex,
    /// Set once a completeness pass has written `has_metadata` on this table.
    pub completeness_checked: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a single-column table, one fresh entry per filename.
    /// Duplicates after the first occurrence are dropped.
    pub fn from_filenames<I, P>(filenames: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut catalog = Self::new();
        for f in filenames {
            catalog.insert(CatalogEntry::new(f));
        }
        catalog
    }

    /// Appends an entry. Returns false (and leaves the table unchanged) if the
    /// filename is already present.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.index.contains_key(entry.filename()) {
            return false;
        }
        self.index.insert(entry.filename.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, filename: &Path) -> Option<&CatalogEntry> {
        self.index.get(filename).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, filename: &Path) -> Option<&mut CatalogEntry> {
        match self.index.get(filename) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    pub fn position(&self, filename: &Path) -> Option<usize> {
        self.index.get(filename).copied()
    }

    /// Filenames in row order.
    pub fn filenames(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.filename.clone()).collect()
    }

    pub fn complete_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_metadata).count()
    }
}
