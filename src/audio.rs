//! WAV decoding helpers.
//!
//! `probe` only parses the header and is what validation uses; `read_mono`
//! decodes the whole file and down-mixes it for spectral analysis.

use crate::error::ItemError;
use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Header-level facts about a decodable WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Frames (samples per channel).
    pub frames: u32,
}

impl WavInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Mono signal in [-1, 1] at the file's own sample rate.
#[derive(Debug, Clone)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

fn open(path: &Path) -> Result<WavReader<std::io::BufReader<std::fs::File>>, ItemError> {
    if !path.is_file() {
        return Err(ItemError::MissingFile(path.to_path_buf()));
    }
    WavReader::open(path).map_err(|e| undecodable(path, e))
}

fn undecodable(path: &Path, err: hound::Error) -> ItemError {
    ItemError::UndecodableFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Parses the header of `path`.
pub fn probe(path: &Path) -> Result<WavInfo, ItemError> {
    let reader = open(path)?;
    let spec = reader.spec();
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

/// Decodes every sample of `path` and averages channels into one.
pub fn read_mono(path: &Path) -> Result<MonoAudio, ItemError> {
    let reader = open(path)?;
    let spec = reader.spec();
    let interleaved = decode_samples(reader, path)?;
    Ok(MonoAudio {
        samples: downmix(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
    })
}

fn decode_samples<R: Read>(mut reader: WavReader<R>, path: &Path) -> Result<Vec<f32>, ItemError> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| undecodable(path, e)),
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| undecodable(path, e))
        }
    }
}

/// Averages interleaved frames down to one channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// `<dir>/<subdir>/<stem><suffix>` for an audio file.
pub fn sibling_path(audio: &Path, subdir: &str, suffix: &str) -> PathBuf {
    let dir = audio.parent().unwrap_or_else(|| Path::new(""));
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(subdir).join(format!("{}{}", stem, suffix))
}
