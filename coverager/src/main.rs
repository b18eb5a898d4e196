//! # coverager - Main Entry Point
//!
//! Replays a recorded host event stream into a collector and writes the
//! reports once the stream reports process exit (or ends).

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use coverager::cli::Args;
use coverager::export::ReportWriter;
use coverager::profiling::Collector;
use coverager::replay::{open_events, replay};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;
    let config = args.collector_config();

    if !quiet {
        println!("coverager v{}", env!("CARGO_PKG_VERSION"));
        println!("output: {}", config.report_paths().summary().display());
    }

    let input = open_events(args.events.as_deref()).with_context(|| match &args.events {
        Some(path) => format!("Failed to open event file {}", path.display()),
        None => "Failed to read events from stdin".to_string(),
    })?;

    let collector = Collector::new(&config, args.process_info());
    let outcome = replay(&collector, input).context("Failed to replay events")?;

    match outcome.exit_code {
        Some(code) => info!("Target exited with code {code}"),
        None => warn!("Event stream ended without a process exit event"),
    }
    outcome.stats.log();

    let snapshot = collector.finish();
    let reports = ReportWriter::new(config.report_paths()).write_all(&snapshot);

    if !quiet {
        let summary = snapshot.summary();
        println!(
            "{} threads, {} modules, {} routines, {} blocks ({} bytes) in {:.1}s",
            summary.threads,
            summary.modules,
            summary.routines,
            summary.blocks,
            summary.covered_bytes,
            summary.elapsed_secs
        );
        for path in &reports.written {
            println!("saved: {}", path.display());
        }
    }
    for skipped in &reports.skipped {
        eprintln!("warning: {skipped}");
    }

    Ok(())
}
