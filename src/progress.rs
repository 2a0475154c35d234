//! Progress reporting for the catalog phases.
//!
//! Interactive runs get one indicatif bar per phase. In log-only mode the
//! bars are hidden and each phase logs `[tag] n/total (pct%)` lines at its
//! own interval instead, for tail-friendly output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Pipeline stages that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Validation,
    Metadata,
    Thumbnails,
}

impl Phase {
    /// Bar/spinner message.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Discovery => "Discovering audio files",
            Phase::Validation => "Validating audio",
            Phase::Metadata => "Checking metadata",
            Phase::Thumbnails => "Rendering thumbnails",
        }
    }

    /// Short tag used in log-only lines.
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Discovery => "discover",
            Phase::Validation => "validate",
            Phase::Metadata => "metadata",
            Phase::Thumbnails => "thumbnails",
        }
    }

    /// Items between log lines in log-only mode. Rendering is slow per file,
    /// probing is fast.
    fn log_interval(self) -> u64 {
        match self {
            Phase::Discovery => 1,
            Phase::Validation => 5_000,
            Phase::Metadata => 10_000,
            Phase::Thumbnails => 250,
        }
    }
}

/// Human-readable elapsed time: `4.2s`, `3.5m`, `1h 05m`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        let total_mins = d.as_secs() / 60;
        format!("{}h {:02}m", total_mins / 60, total_mins % 60)
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Progress for one phase over a known number of items.
///
/// `inc` takes `&self` so rayon closures and the thumbnail collector can
/// share one tracker.
pub struct PhaseProgress {
    phase: Phase,
    bar: ProgressBar,
    total: u64,
    done: AtomicU64,
}

impl PhaseProgress {
    pub fn start(phase: Phase, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if is_log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            bar.set_style(bar_style());
        }
        bar.set_message(phase.label());
        Self {
            phase,
            bar,
            total,
            done: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
        let current = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if is_log_only() && should_log(current, self.total, self.phase.log_interval()) {
            let pct = 100.0 * current as f64 / self.total as f64;
            info!("[{}] {}/{} ({:.1}%)", self.phase.tag(), current, self.total, pct);
        }
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    /// Leaves the bar on screen with `summary`.
    pub fn finish(&self, summary: String) {
        self.bar.finish_with_message(summary);
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

fn should_log(current: u64, total: u64, interval: u64) -> bool {
    total > 0 && (current % interval.max(1) == 0 || current == total)
}

/// Spinner for phases with no known length (discovery).
/// Hidden in log-only mode.
pub fn create_spinner(phase: Phase) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        info!("[{}] started", phase.tag());
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(phase.label());
    pb
}
