//! Progress reporting for a comparison run
//!
//! Provides a live spinner using indicatif plus the header and summary
//! printed around a run.

use crate::compare::CompareReport;
use crate::config::CompareConfig;
use crate::stats::display::{format_duration, format_timestamp};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Snapshot of run progress for display
#[derive(Debug, Clone, Default)]
pub struct CompareProgress {
    /// Relative path being examined
    pub current: String,

    /// Entries yielded by the walker so far
    pub seen: u64,

    /// Entries compared
    pub processed: u64,

    /// Entries found different
    pub different: u64,

    /// Entries skipped
    pub skipped: u64,

    /// Entries that errored
    pub errors: u64,

    /// Bytes hashed from the old tree
    pub bytes: u64,

    /// Elapsed time
    pub elapsed: Duration,
}

impl CompareProgress {
    /// Compared entries per second
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Receives progress from a running comparison, once per entry
pub trait ProgressSink {
    /// Called after an entry has been recorded, before any flush
    fn update(&self, progress: &CompareProgress);

    /// The run completed
    fn complete(&self) {}

    /// The run ended early
    fn abort(&self, _reason: &str) {}
}

/// Progress reporter that displays comparison status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &CompareProgress) {
        let msg = format!(
            "Files: {} | Different: {} | Skipped: {} | Errors: {} | {} | {:.0}/s | Testing {}",
            format_number(progress.processed),
            format_number(progress.different),
            format_number(progress.skipped),
            format_number(progress.errors),
            format_size(progress.bytes, BINARY),
            progress.files_per_second(),
            progress.current,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressReporter {
    fn update(&self, progress: &CompareProgress) {
        ProgressReporter::update(self, progress);
    }

    fn complete(&self) {
        self.finish_and_clear();
    }

    fn abort(&self, reason: &str) {
        self.finish(reason);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the run
pub fn print_header(config: &CompareConfig) {
    println!();
    println!(
        "{} {}",
        style("csum-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Old root:").bold(), config.old_root.display());
    println!("  {} {}", style("New root:").bold(), config.new_root.display());
    println!(
        "  {} {}{}",
        style("Checksum:").bold(),
        config.algorithm,
        if config.verify { " + byte verify" } else { "" }
    );
    println!(
        "  {} {}",
        style("Chunk size:").bold(),
        format_size(config.chunk_size as u64, BINARY)
    );
    println!("  {} {}", style("Workers:").bold(), config.worker_count);
    println!("  {} {}", style("Stats:").bold(), config.stats_path.display());
    println!();
}

/// Print a summary of the run results
pub fn print_summary(report: &CompareReport) {
    let stats = &report.stats;
    let duration_secs = report.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        stats.processed() as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Comparison Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files compared:").bold(),
        format_number(stats.processed())
    );

    let diff_line = format!(
        "  {} {}",
        style("Different:").bold(),
        format_number(stats.diff_count())
    );
    if stats.diff_count() > 0 {
        println!("{}", style(diff_line).red());
    } else {
        println!("{}", diff_line);
    }

    println!(
        "  {} {}",
        style("Skipped:").bold(),
        format_number(stats.skipped())
    );
    if stats.error_count() > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(stats.error_count())
        );
    }
    println!(
        "  {} {}",
        style("Data compared:").bold(),
        format_size(stats.bytes_compared(), BINARY)
    );
    println!(
        "  {} {} ({:.0} files/sec)",
        style("Duration:").bold(),
        format_duration(report.duration),
        rate
    );
    println!(
        "  {} {}",
        style("Stats file:").bold(),
        report.stats_path.display()
    );
    println!();
    println!(
        "Finished comparing {} and {} at {}",
        stats.old_root(),
        stats.new_root(),
        format_timestamp(stats.finished().unwrap_or_else(|| stats.started()))
    );
}
