//! csum-stats - Pretty-print a csum-walker stats file
//!
//! With `--watch` the file is re-read periodically so a running comparison
//! can be followed from another terminal.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use console::Term;
use csum_walker::stats::{load_stats, render_stats};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

/// Print statistics from a csum-walker stats file
#[derive(Parser, Debug)]
#[command(name = "csum-stats", version)]
struct Args {
    /// Stats file written by csum-walker
    #[arg(value_name = "STATS_FILE")]
    stats_file: PathBuf,

    /// Re-read and print the file every SECS seconds
    #[arg(short = 'w', long, env = "CSUM_WATCH", value_name = "SECS")]
    watch: Option<f64>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let Some(secs) = args.watch else {
        let stats = load_stats(&args.stats_file)
            .with_context(|| format!("Failed to read {}", args.stats_file.display()))?;
        print!("{}", render_stats(&stats, Utc::now().timestamp()));
        return Ok(());
    };

    let interval = Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .with_context(|| format!("Invalid watch interval: {}", secs))?;

    let term = Term::stdout();
    loop {
        let (_, cols) = term.size();
        println!("{}", "#".repeat(cols as usize));

        match load_stats(&args.stats_file) {
            Ok(stats) => print!("{}", render_stats(&stats, Utc::now().timestamp())),
            // The writer may be mid-rename, or the run has not flushed yet
            Err(e) if e.is_transient() => {
                println!("Stats file not readable yet ({}), retrying", e);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", args.stats_file.display()))
            }
        }

        thread::sleep(interval);
    }
}
