//! Mel power spectrogram and decibel scaling.
//!
//! librosa conventions: Slaney mel scale with area normalization, centered
//! frames with zero padding, power = |X|^2, and dB referenced to the loudest
//! cell with an 80 dB floor.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Floor applied before taking logarithms.
pub const AMIN: f32 = 1e-10;

/// Dynamic range kept below the reference by `power_to_db`.
pub const TOP_DB: f32 = 80.0;

// ============================================================================
// Framing
// ============================================================================

/// Block, FFT and hop sizes derived from a block duration at one sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisFrame {
    /// Window length in samples, always even.
    pub block_len: usize,
    /// Next power of two >= `block_len`.
    pub n_fft: usize,
    pub hop: usize,
}

impl AnalysisFrame {
    pub fn for_sample_rate(sample_rate: u32, block_ms: f64, overlap: f64) -> Self {
        let mut block_len = (sample_rate as f64 * block_ms / 1000.0) as usize;
        if block_len % 2 != 0 {
            block_len += 1;
        }
        // Degenerate rates would otherwise give a zero hop.
        let block_len = block_len.max(2);
        let n_fft = block_len.next_power_of_two();
        let overlap_samples = (block_len as f64 * overlap) as usize;
        let hop = (block_len - overlap_samples).max(1);
        Self {
            block_len,
            n_fft,
            hop,
        }
    }
}

/// Minimum sample count for one analysis block at `sample_rate`.
pub fn min_samples(sample_rate: u32, block_ms: f64) -> usize {
    (sample_rate as f64 * block_ms / 1000.0).ceil() as usize
}

/// Periodic Hann window of `len` samples, centered in an `n_fft` frame.
pub fn hann_window(len: usize, n_fft: usize) -> Vec<f32> {
    let mut window = vec![0.0f32; n_fft];
    let offset = (n_fft - len.min(n_fft)) / 2;
    for n in 0..len.min(n_fft) {
        let phase = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
        window[offset + n] = (0.5 - 0.5 * phase.cos()) as f32;
    }
    window
}

// ============================================================================
// Mel scale
// ============================================================================

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filters, `n_mels` rows of `n_fft / 2 + 1` weights.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
            let enorm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - left) / (center - left);
                    let upper = (right - f) / (right - center);
                    (lower.min(upper).max(0.0) * enorm) as f32
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Spectrogram
// ============================================================================

/// Row-major `n_mels x n_frames` matrix.
#[derive(Debug, Clone)]
pub struct MelSpectrogram {
    pub n_mels: usize,
    pub n_frames: usize,
    pub data: Vec<f32>,
}

impl MelSpectrogram {
    pub fn get(&self, mel: usize, frame: usize) -> f32 {
        self.data[mel * self.n_frames + frame]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max)
    }
}

/// Power spectrogram projected onto `n_mels` bands between 0 Hz and `fmax`.
pub fn mel_power_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    frame: AnalysisFrame,
    n_mels: usize,
    fmax: f64,
) -> MelSpectrogram {
    let AnalysisFrame { block_len, n_fft, hop } = frame;
    let pad = n_fft / 2;
    let n_frames = 1 + samples.len() / hop;
    let n_bins = n_fft / 2 + 1;

    let window = hann_window(block_len, n_fft);
    let filters = mel_filterbank(sample_rate, n_fft, n_mels, 0.0, fmax);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

    let mut data = vec![0.0f32; n_mels * n_frames];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
    let mut power = vec![0.0f32; n_bins];

    for t in 0..n_frames {
        // Frame t covers padded[t*hop .. t*hop + n_fft]; padding is zeros.
        let start = (t * hop) as isize - pad as isize;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let idx = start + i as isize;
            let x = if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            };
            *slot = Complex::new(x * window[i], 0.0);
        }
        fft.process(&mut buffer);

        for (k, p) in power.iter_mut().enumerate() {
            *p = buffer[k].norm_sqr();
        }
        for (m, weights) in filters.iter().enumerate() {
            data[m * n_frames + t] = weights.iter().zip(&power).map(|(w, p)| w * p).sum();
        }
    }

    MelSpectrogram {
        n_mels,
        n_frames,
        data,
    }
}

/// Converts power to dB relative to the spectrogram's own maximum.
/// Results lie in `[-TOP_DB, 0]`.
pub fn power_to_db(spec: &MelSpectrogram) -> MelSpectrogram {
    let ref_db = 10.0 * spec.max().max(AMIN).log10();
    let mut data: Vec<f32> = spec
        .data
        .iter()
        .map(|&p| 10.0 * p.max(AMIN).log10() - ref_db)
        .collect();
    let floor = data.iter().copied().fold(f32::MIN, f32::max) - TOP_DB;
    for v in &mut data {
        *v = v.max(floor);
    }
    MelSpectrogram {
        n_mels: spec.n_mels,
        n_frames: spec.n_frames,
        data,
    }
}

/// Maps `[min_db, max_db]` onto `[0, 1]`, clamping anything outside.
pub fn normalize_db(db: f32, min_db: f32, max_db: f32) -> f32 {
    ((db - min_db) / (max_db - min_db)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frame_sizes() {
        // 2205 samples -> forced even
        let f = AnalysisFrame::for_sample_rate(44100, 50.0, 0.5);
        assert_eq!(f, AnalysisFrame { block_len: 2206, n_fft: 4096, hop: 1103 });

        let f = AnalysisFrame::for_sample_rate(48000, 50.0, 0.5);
        assert_eq!(f, AnalysisFrame { block_len: 2400, n_fft: 4096, hop: 1200 });

        let f = AnalysisFrame::for_sample_rate(8000, 50.0, 0.5);
        assert_eq!(f, AnalysisFrame { block_len: 400, n_fft: 512, hop: 200 });
    }

    #[test]
    fn test_min_samples() {
        assert_eq!(min_samples(44100, 50.0), 2205);
        assert_eq!(min_samples(22050, 50.0), 1103);
    }

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 440.0, 1000.0, 3500.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_hann_window_is_centered() {
        let w = hann_window(4, 8);
        assert_eq!(w.len(), 8);
        assert_eq!(&w[..2], &[0.0, 0.0]);
        assert_eq!(&w[6..], &[0.0, 0.0]);
        assert!((w[2] - 0.0).abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_filterbank_shape_and_range() {
        let filters = mel_filterbank(44100, 4096, 40, 0.0, 8000.0);
        assert_eq!(filters.len(), 40);
        assert!(filters.iter().all(|f| f.len() == 2049));
        assert!(filters.iter().flatten().all(|&w| w >= 0.0));
        // Nothing above fmax contributes.
        let cutoff = (8000.0 * 4096.0 / 44100.0) as usize + 2;
        assert!(filters.iter().all(|f| f[cutoff..].iter().all(|&w| w == 0.0)));
        assert!(filters.iter().all(|f| f.iter().any(|&w| w > 0.0)));
    }

    #[test]
    fn test_sine_energy_lands_in_matching_band() {
        let sr = 22050;
        let frame = AnalysisFrame::for_sample_rate(sr, 50.0, 0.5);
        let spec = mel_power_spectrogram(&sine(440.0, sr, sr as usize), sr, frame, 40, 8000.0);
        assert_eq!(spec.n_mels, 40);
        assert_eq!(spec.n_frames, 1 + sr as usize / frame.hop);

        let mid = spec.n_frames / 2;
        let loudest = (0..40)
            .max_by(|&a, &b| spec.get(a, mid).total_cmp(&spec.get(b, mid)))
            .unwrap();
        let mel_f: Vec<f64> = (0..42)
            .map(|i| mel_to_hz(hz_to_mel(8000.0) * i as f64 / 41.0))
            .collect();
        assert!(mel_f[loudest] < 440.0 && 440.0 < mel_f[loudest + 2]);
    }

    #[test]
    fn test_power_to_db_range() {
        let sr = 16000;
        let frame = AnalysisFrame::for_sample_rate(sr, 50.0, 0.5);
        let spec = mel_power_spectrogram(&sine(1000.0, sr, 4000), sr, frame, 40, 8000.0);
        let db = power_to_db(&spec);
        let max = db.max();
        let min = db.data.iter().copied().fold(f32::MAX, f32::min);
        assert!(max.abs() < 1e-4);
        assert!(min >= -TOP_DB - 1e-4);
    }

    #[test]
    fn test_silence_is_zero_db() {
        let sr = 8000;
        let frame = AnalysisFrame::for_sample_rate(sr, 50.0, 0.5);
        let spec = mel_power_spectrogram(&vec![0.0; 400], sr, frame, 40, 8000.0);
        let db = power_to_db(&spec);
        assert!(db.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_db_clamps() {
        assert_eq!(normalize_db(-80.0, -80.0, 0.0), 0.0);
        assert_eq!(normalize_db(0.0, -80.0, 0.0), 1.0);
        assert_eq!(normalize_db(-40.0, -80.0, 0.0), 0.5);
        assert_eq!(normalize_db(-120.0, -80.0, 0.0), 0.0);
        assert_eq!(normalize_db(6.0, -80.0, 0.0), 1.0);
    }
}
