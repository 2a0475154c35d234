//! End-to-end runs over a temporary sample library.

use hound::{SampleFormat, WavSpec, WavWriter};
use sample_catalog::cancel::CancelToken;
use sample_catalog::completeness::check_metadata;
use sample_catalog::discovery::discover_wav_files;
use sample_catalog::persist::{load_catalog, save_catalog};
use sample_catalog::query::{
    find_patterns_in_filenames, read_filename_list, write_filename_list, FilenamePattern,
    QueryOptions,
};
use sample_catalog::thumbnail::{generate_thumbnails, thumbnail_path, ThumbnailRecipe};
use sample_catalog::validate::validate_into_catalog;
use sample_catalog::{ArtifactKind, ItemError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(path: &Path, sample_rate: u32, frames: usize) {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let s = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_artifacts(audio: &Path, kinds: &[ArtifactKind]) {
    let dir = audio.parent().unwrap();
    let stem = audio.file_stem().unwrap().to_string_lossy();
    for kind in kinds {
        let sub = dir.join(kind.subdir());
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("{}{}", stem, kind.suffix())), "{}").unwrap();
    }
}

#[test]
fn test_kick_and_broken_file() {
    let tmp = TempDir::new().unwrap();
    let kick = tmp.path().join("kick.wav");
    let broken = tmp.path().join("broken.wav");
    write_wav(&kick, 44100, 44100);
    fs::write(&broken, b"").unwrap();

    let discovered = discover_wav_files(tmp.path());
    assert_eq!(discovered, vec![broken.clone(), kick.clone()]);

    let (catalog, report) = validate_into_catalog(&discovered);
    assert_eq!(report.valid, vec![kick.clone()]);
    assert_eq!(report.rejected.len(), 1);
    let (path, err) = &report.rejected[0];
    assert_eq!(path, &broken);
    assert!(matches!(err, ItemError::UndecodableFile { .. }));
    assert!(err.to_string().contains("is not a valid wave file"));

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.entries()[0].filename(), kick.as_path());
}

#[test]
fn test_missing_path_is_reported_as_missing() {
    let tmp = TempDir::new().unwrap();
    let gone = tmp.path().join("gone.wav");
    let (catalog, report) = validate_into_catalog(&[gone.clone()]);
    assert!(catalog.is_empty());
    assert!(matches!(&report.rejected[0].1, ItemError::MissingFile(p) if p == &gone));
    assert!(report.rejected[0].1.to_string().contains("does not exist"));
}

#[test]
fn test_hihat_query_keeps_catalog_order() {
    let tmp = TempDir::new().unwrap();
    let names = ["Loop_HH_01.wav", "kick_only.wav", "HiHat_closed.wav"];
    let paths: Vec<PathBuf> = names.iter().map(|n| tmp.path().join(n)).collect();
    for p in &paths {
        write_wav(p, 22050, 2205);
    }

    let (catalog, _) = validate_into_catalog(&paths);
    let pattern = FilenamePattern::parse("(HH)|(Hat)|(hihat)").unwrap();
    let hits = find_patterns_in_filenames(&catalog, &pattern, QueryOptions::default());
    assert_eq!(hits, vec![paths[0].clone(), paths[2].clone()]);
}

#[test]
fn test_full_pipeline_round_trip() {
    let tmp = TempDir::new().unwrap();
    let lib = tmp.path().join("library");
    let hat = lib.join("drums/Closed_Hat.wav");
    let snare = lib.join("drums/snare.wav");
    let pad = lib.join("synth/pad.wav");
    write_wav(&hat, 44100, 22050);
    write_wav(&snare, 44100, 22050);
    write_wav(&pad, 44100, 1000);
    write_artifacts(&hat, &ArtifactKind::ALL);
    write_artifacts(&snare, &[ArtifactKind::Chroma]);
    write_artifacts(&pad, &ArtifactKind::ALL);

    let discovered = discover_wav_files(&lib);
    let (mut catalog, report) = validate_into_catalog(&discovered);
    assert!(report.rejected.is_empty());

    let completeness = check_metadata(&mut catalog, None);
    assert_eq!(completeness.complete_count(), 2);
    assert_eq!(completeness.missing.len(), 2);
    assert!(catalog.get(&hat).unwrap().has_metadata);
    assert!(!catalog.get(&snare).unwrap().has_metadata);
    assert!(catalog.get(&snare).unwrap().chroma_metadata_path.is_some());

    let table = tmp.path().join("sample_catalog.csv");
    save_catalog(&catalog, &table).unwrap();
    let reloaded = load_catalog(&table).unwrap();
    assert_eq!(reloaded.entries(), catalog.entries());

    let strict = QueryOptions {
        metadata_is_necessary: true,
        ..Default::default()
    };
    let complete = find_patterns_in_filenames(&reloaded, &FilenamePattern::parse("drums|synth").unwrap(), strict);
    assert_eq!(complete, vec![hat.clone(), pad.clone()]);

    let export = tmp.path().join("complete.csv");
    write_filename_list(&export, &complete).unwrap();
    let files = read_filename_list(&export).unwrap();

    let thumbs = generate_thumbnails(&files, &ThumbnailRecipe::default(), 2, &CancelToken::new());
    assert_eq!(thumbs.written, vec![thumbnail_path(&hat)]);
    assert_eq!(thumbs.skipped.len(), 1);
    assert!(matches!(thumbs.skipped[0].1, ItemError::TooShortAudio { .. }));
    assert!(lib.join("drums/thumbnails/Closed_Hat.png").is_file());
    assert!(!lib.join("synth/thumbnails/pad.png").exists());
}
