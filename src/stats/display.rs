//! Human-readable rendering of a stats snapshot
//!
//! Used by `csum-stats`, which may poll the file while a run is in progress.

use crate::stats::RunStats;
use chrono::{DateTime, Local};
use humansize::{format_size, BINARY};
use std::fmt::Write;
use std::time::Duration;

/// Render a stats snapshot; `now` is epoch seconds, used for the elapsed time of running jobs
pub fn render_stats(stats: &RunStats, now: i64) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Comparing {} and {} using {}{}",
        stats.old_root(),
        stats.new_root(),
        stats.algorithm(),
        if stats.verify() { " (+ byte verification)" } else { "" }
    );

    match stats.finished() {
        Some(finished) => {
            let _ = writeln!(out, "Started: {}", format_timestamp(stats.started()));
            let _ = writeln!(out, "Finished: {}", format_timestamp(finished));
        }
        None => {
            let _ = writeln!(out, "Running since: {}", format_timestamp(stats.started()));
        }
    }

    let _ = writeln!(out, "Elapsed: {}", format_duration(stats.elapsed(now)));
    let _ = writeln!(out, "Files processed: {}", stats.processed());
    let _ = writeln!(out, "Number of error files: {}", stats.error_count());
    let _ = writeln!(out, "Number of different files: {}", stats.diff_count());
    let _ = writeln!(out, "Number of skipped files: {}", stats.skipped());
    let _ = writeln!(
        out,
        "Data compared: {}",
        format_size(stats.bytes_compared(), BINARY)
    );

    out
}

/// Format epoch seconds in local time
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => secs.to_string(),
    }
}

/// Format a duration as "1h 02m 03s"
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
