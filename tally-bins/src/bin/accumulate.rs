//! Participation-Rate Accumulation Runner
//!
//! Replays a trade file through the accumulation strategy and reports how
//! much notional was captured before the target was crossed.
//!
//! Exit codes: 0 success, 1 bad input or config, 2 target not reached,
//! 3 market VWAP rose above the strategy VWAP.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tally_bins::common::{clear_cache, exit_code, init_logging, CommonArgs};
use tally_core::report::{write_csv_file, RunSummary};
use tally_strategies::{AccumulateRunner, RunOptions};

fn main() -> ExitCode {
    // Parse CLI arguments
    let args = CommonArgs::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(args: &CommonArgs) -> Result<()> {
    let cfg = args.load_config()?;

    // Initialize logging
    init_logging(&cfg.logging)?;

    tracing::info!("=== Tally: Participation-Rate Accumulation ===");

    if args.clear_cache {
        clear_cache(&cfg)?;
        if cfg.data_path.is_none() {
            return Ok(());
        }
    }

    let runner = AccumulateRunner::from_config(&cfg)?;
    tracing::info!("Side: {}", runner.side());
    tracing::info!("Bucket exponent: {}", runner.downsample_exponent());
    match runner.cache() {
        Some(cache) => tracing::info!("Cache: {}", cache.dir().display()),
        None => tracing::info!("Cache: disabled"),
    }

    let path = cfg
        .data_path
        .as_deref()
        .context("No trade file given (pass --data or set data_path)")?;

    let rows = runner.run_accumulate_strat(path, &RunOptions::from(&cfg))?;

    if let Some(summary) = RunSummary::from_rows(runner.side(), &rows) {
        summary.log();
    }

    if let Some(output) = &args.output {
        write_csv_file(output, &rows)?;
    }

    Ok(())
}
