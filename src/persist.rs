//! Persisted catalog table.
//!
//! CSV with a mandatory `Filename` column. Artifact columns and
//! `Has_Metadata` are written once a completeness pass has run (or any row
//! carries an artifact path) and are optional on load. Booleans are written
//! as `True`/`False`, which is what existing catalog files contain.

use crate::models::{ArtifactKind, Catalog, CatalogEntry};
use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FILENAME_COLUMN: &str = "Filename";
pub const HAS_METADATA_COLUMN: &str = "Has_Metadata";

fn includes_metadata_columns(catalog: &Catalog) -> bool {
    catalog.completeness_checked || catalog.entries().iter().any(|e| e.has_any_artifact())
}

fn path_cell(p: Option<&Path>) -> String {
    p.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}

pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create catalog file {}", path.display()))?;

    let with_metadata = includes_metadata_columns(catalog);
    let mut header = vec![FILENAME_COLUMN];
    if with_metadata {
        header.extend(ArtifactKind::ALL.iter().map(|k| k.column()));
        header.push(HAS_METADATA_COLUMN);
    }
    writer.write_record(&header)?;

    for entry in catalog.entries() {
        let mut row = vec![path_cell(Some(entry.filename()))];
        if with_metadata {
            for kind in ArtifactKind::ALL {
                row.push(path_cell(entry.artifact(kind)));
            }
            row.push(if entry.has_metadata { "True" } else { "False" }.to_string());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Saved {} catalog rows to {}", catalog.len(), path.display());
    Ok(())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty())
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open catalog file {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let filename_idx = column(&headers, FILENAME_COLUMN)
        .ok_or_else(|| anyhow!("Catalog {} has no {} column", path.display(), FILENAME_COLUMN))?;
    let artifact_idx = ArtifactKind::ALL.map(|k| column(&headers, k.column()));
    let has_metadata_idx = column(&headers, HAS_METADATA_COLUMN);

    let mut catalog = Catalog::new();
    catalog.completeness_checked = has_metadata_idx.is_some();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad row {} in {}", line + 2, path.display()))?;
        let Some(filename) = cell(&record, Some(filename_idx)) else {
            bail!("Row {} in {} has an empty {}", line + 2, path.display(), FILENAME_COLUMN);
        };

        let mut entry = CatalogEntry::new(filename);
        for (kind, idx) in ArtifactKind::ALL.into_iter().zip(artifact_idx) {
            if let Some(p) = cell(&record, idx) {
                entry.set_artifact(kind, PathBuf::from(p));
            }
        }
        if let Some(raw) = cell(&record, has_metadata_idx) {
            entry.has_metadata = parse_bool(raw).ok_or_else(|| {
                anyhow!("Row {} in {}: bad {} value '{}'", line + 2, path.display(), HAS_METADATA_COLUMN, raw)
            })?;
        }

        if !catalog.insert(entry) {
            warn!("Duplicate catalog row ignored: {}", filename);
        }
    }

    info!("Loaded {} catalog rows from {}", catalog.len(), path.display());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_single_column_before_check() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("catalog.csv");
        let catalog = Catalog::from_filenames(["/lib/a.wav", "/lib/b.wav"]);
        save_catalog(&catalog, &out).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "Filename\n/lib/a.wav\n/lib/b.wav\n");
        let loaded = load_catalog(&out).unwrap();
        assert_eq!(loaded.filenames(), catalog.filenames());
        assert!(!loaded.completeness_checked);
    }

    #[test]
    fn test_roundtrip_with_metadata() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("catalog.csv");

        let mut catalog = Catalog::new();
        let mut full = CatalogEntry::new("/lib/a.wav");
        for kind in ArtifactKind::ALL {
            full.set_artifact(kind, PathBuf::from(format!("/lib/{}/a.json", kind.subdir())));
        }
        full.has_metadata = true;
        let mut partial = CatalogEntry::new("/lib/b.wav");
        partial.set_artifact(ArtifactKind::Chroma, PathBuf::from("/lib/chroma_analysis/b_chroma.json"));
        catalog.insert(full.clone());
        catalog.insert(partial.clone());
        catalog.completeness_checked = true;

        save_catalog(&catalog, &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("Filename,AudioCommons_Metadata,Chroma_Metadata,PT_Metadata,Has_Metadata\n"));
        assert!(text.contains(",True\n"));

        let loaded = load_catalog(&out).unwrap();
        assert!(loaded.completeness_checked);
        assert_eq!(loaded.entries(), &[full, partial]);
    }

    #[test]
    fn test_load_foreign_table() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("musicradar_df.csv");
        fs::write(
            &src,
            "Filename,Has_Metadata,Extra\n/x/a.wav,true,1\n/x/b.wav,FALSE,2\n/x/a.wav,False,3\n",
        )
        .unwrap();

        let loaded = load_catalog(&src).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.entries()[0].has_metadata);
        assert!(!loaded.entries()[1].has_metadata);
    }

    #[test]
    fn test_load_rejects_missing_filename_column() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("bad.csv");
        fs::write(&src, "Path\n/x/a.wav\n").unwrap();
        let err = load_catalog(&src).unwrap_err();
        assert!(err.to_string().contains("no Filename column"));
    }
}
