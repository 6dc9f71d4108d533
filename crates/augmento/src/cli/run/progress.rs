//! Progress bar and end-of-run summary.

use std::path::PathBuf;

use augmento_core::{Image, ImageSink, PipelineResult, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};

/// Sink wrapper that advances a progress bar on every save attempt.
pub struct ProgressSink<S> {
    inner: S,
    bar: ProgressBar,
    start: std::time::Instant,
}

impl<S: ImageSink> ProgressSink<S> {
    pub fn new(inner: S, bar: ProgressBar) -> Self {
        Self {
            inner,
            bar,
            start: std::time::Instant::now(),
        }
    }
}

impl<S: ImageSink> ImageSink for ProgressSink<S> {
    fn save(&mut self, image: &Image) -> PipelineResult<PathBuf> {
        let result = self.inner.save(image);
        self.bar.inc(1);
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.bar
                .set_message(format!("{:.1} img/sec", self.bar.position() as f64 / elapsed));
        }
        result
    }

    fn finish(&mut self) -> PipelineResult<()> {
        self.inner.finish()
    }
}

/// Create a progress bar for the run.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
pub fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Saved:        {:>8}", summary.saved);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.save_failed > 0 {
        eprintln!("    Save errors:  {:>8}", summary.save_failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Tasks:        {:>8}", summary.total_tasks);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", summary.images_per_second());
    eprintln!("  ====================================");
}
