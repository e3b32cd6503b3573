//! csum-walker - Checksum-based directory tree comparison
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use csum_walker::compare::Comparator;
use csum_walker::config::{CliArgs, CompareConfig};
use csum_walker::progress::{print_header, print_summary, ProgressReporter};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate before anything is read or written
    let config = CompareConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(&config);
    }

    let mut comparator =
        Comparator::new(config.clone()).context("Failed to initialize comparison")?;

    // First Ctrl+C stops after the current chunk, a second one exits at once
    let shutdown_flag = comparator.shutdown_flag();
    ctrlc::set_handler(move || {
        if shutdown_flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nForce shutdown!");
            std::process::exit(1);
        }
        eprintln!("\nInterrupt received, shutting down... (press Ctrl+C again to force)");
    })
    .context("Failed to set signal handler")?;

    if config.show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Walking old root...");
        comparator = comparator.with_progress(progress);
    }

    let report = comparator.run().context("Comparison failed")?;

    print_summary(&report);

    if report.stats.diff_count() > 0 {
        info!(different = report.stats.diff_count(), "Differences found");
    }

    if report.stats.error_count() > 0 {
        info!(errors = report.stats.error_count(), "Comparison completed with errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("csum_walker=debug,warn")
    } else {
        EnvFilter::new("csum_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
