//! Spectrogram thumbnails.
//!
//! One PNG per audio file, written to `<audio dir>/thumbnails/<stem>.png`.
//! The picture is the file's mel spectrogram in dB, normalized to a fixed
//! range and colored with viridis, low frequencies at the bottom.

use crate::audio::{read_mono, sibling_path};
use crate::cancel::CancelToken;
use crate::error::ItemError;
use crate::progress::{Phase, PhaseProgress};
use crate::spectrogram::{mel_power_spectrogram, min_samples, normalize_db, power_to_db, AnalysisFrame};
use crossbeam_channel::{bounded, unbounded};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Fixed visualization recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRecipe {
    pub block_ms: f64,
    /// Fraction of a block shared with the next one.
    pub overlap: f64,
    pub fmax: f64,
    pub n_mels: usize,
    pub db_min: f32,
    pub db_max: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailRecipe {
    fn default() -> Self {
        Self {
            block_ms: 50.0,
            overlap: 0.5,
            fmax: 8000.0,
            n_mels: 40,
            db_min: -80.0,
            db_max: 0.0,
            width: 256,
            height: 128,
        }
    }
}

/// 256-entry viridis lookup, indexed by 8-bit intensity.
static VIRIDIS: Lazy<Vec<Rgb<u8>>> = Lazy::new(|| {
    (0..256)
        .map(|i| {
            let c = colorous::VIRIDIS.eval_continuous(i as f64 / 255.0);
            Rgb([c.r, c.g, c.b])
        })
        .collect()
});

pub fn thumbnail_path(audio: &Path) -> PathBuf {
    sibling_path(audio, THUMBNAIL_DIR, ".png")
}

fn image_write_error(path: &Path, reason: impl ToString) -> ItemError {
    ItemError::ImageWrite {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Renders the mel spectrogram of `samples` to an RGB raster of the
/// recipe's output size.
pub fn render_image(samples: &[f32], sample_rate: u32, recipe: &ThumbnailRecipe) -> RgbImage {
    let frame = AnalysisFrame::for_sample_rate(sample_rate, recipe.block_ms, recipe.overlap);
    let mel = mel_power_spectrogram(samples, sample_rate, frame, recipe.n_mels, recipe.fmax);
    let db = power_to_db(&mel);

    let mut raster = RgbImage::new(db.n_frames as u32, db.n_mels as u32);
    for m in 0..db.n_mels {
        let y = (db.n_mels - 1 - m) as u32;
        for t in 0..db.n_frames {
            let level = normalize_db(db.get(m, t), recipe.db_min, recipe.db_max);
            let index = (level * 255.0) as usize;
            raster.put_pixel(t as u32, y, VIRIDIS[index.min(255)]);
        }
    }

    imageops::resize(&raster, recipe.width, recipe.height, FilterType::Nearest)
}

/// Builds and writes the thumbnail for one file. Returns the PNG path.
pub fn render_thumbnail(audio: &Path, recipe: &ThumbnailRecipe) -> Result<PathBuf, ItemError> {
    let signal = read_mono(audio)?;
    if signal.samples.is_empty() {
        return Err(ItemError::EmptyAudio(audio.to_path_buf()));
    }
    let required = min_samples(signal.sample_rate, recipe.block_ms);
    if signal.samples.len() < required {
        return Err(ItemError::TooShortAudio {
            path: audio.to_path_buf(),
            samples: signal.samples.len(),
            required,
        });
    }

    let image = render_image(&signal.samples, signal.sample_rate, recipe);

    let out = thumbnail_path(audio);
    if let Some(dir) = out.parent() {
        fs::create_dir_all(dir).map_err(|e| image_write_error(&out, e))?;
    }
    image
        .save_with_format(&out, ImageFormat::Png)
        .map_err(|e| image_write_error(&out, e))?;
    debug!("Wrote thumbnail {}", out.display());
    Ok(out)
}

// ============================================================================
// Batch runner
// ============================================================================

#[derive(Debug, Default)]
pub struct ThumbnailReport {
    /// Thumbnails written, in input order.
    pub written: Vec<PathBuf>,
    /// Files skipped with the reason, in input order.
    pub skipped: Vec<(PathBuf, ItemError)>,
    /// Files never started because the run was cancelled.
    pub not_started: Vec<PathBuf>,
    pub cancelled: bool,
}

struct Job {
    idx: usize,
    audio: PathBuf,
}

struct Outcome {
    idx: usize,
    result: Result<PathBuf, ItemError>,
}

/// Generates thumbnails for `files` on `workers` threads (0 = one per core).
///
/// Per-file failures are logged and collected; they never stop the batch.
/// Workers check `cancel` before each file.
pub fn generate_thumbnails(
    files: &[PathBuf],
    recipe: &ThumbnailRecipe,
    workers: usize,
    cancel: &CancelToken,
) -> ThumbnailReport {
    let workers = if workers > 0 {
        workers
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    };

    let progress = PhaseProgress::start(Phase::Thumbnails, files.len() as u64);
    let mut results: Vec<Option<Result<PathBuf, ItemError>>> = files.iter().map(|_| None).collect();

    let (job_tx, job_rx) = bounded::<Job>(workers * 4);
    let (out_tx, out_rx) = unbounded::<Outcome>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = out_tx.clone();
            scope.spawn(move || {
                while let Ok(job) = rx.recv() {
                    if cancel.is_cancelled() {
                        continue;
                    }
                    let result = render_thumbnail(&job.audio, recipe);
                    let _ = tx.send(Outcome { idx: job.idx, result });
                }
            });
        }
        drop(job_rx);
        drop(out_tx); // collector ends when the last worker exits

        scope.spawn(move || {
            for (idx, audio) in files.iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }
                let job = Job {
                    idx,
                    audio: audio.clone(),
                };
                if job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        for outcome in out_rx.iter() {
            if let Err(e) = &outcome.result {
                warn!("Skipping thumbnail: {}", e);
            }
            results[outcome.idx] = Some(outcome.result);
            progress.inc();
        }
    });

    let mut report = ThumbnailReport {
        cancelled: cancel.is_cancelled(),
        ..Default::default()
    };
    for (audio, result) in files.iter().zip(results) {
        match result {
            Some(Ok(out)) => report.written.push(out),
            Some(Err(e)) => report.skipped.push((audio.clone(), e)),
            None => report.not_started.push(audio.clone()),
        }
    }

    progress.finish(format!(
        "Rendered {} thumbnails ({} skipped)",
        report.written.len(),
        report.skipped.len()
    ));
    report
}
