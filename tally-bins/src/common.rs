//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tally_core::cache::ResultCache;
use tally_core::config::{LoggingConfig, RunConfig};
use tally_core::{RunError, Side};

/// Common CLI arguments for all binaries
///
/// Every run option can come from the config file or `TALLY__*` environment
/// variables; flags given here override both.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Trade file to replay
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Strategy side: 1 (buy) or -1 (sell)
    #[arg(short, long, allow_hyphen_values = true)]
    pub side: Option<i8>,

    /// Bucket exponent (1..=17)
    #[arg(long)]
    pub downsample_exponent: Option<u32>,

    /// Ignore trades before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Fraction of each qualified trade captured, in (0, 1]
    #[arg(long)]
    pub target_participation_rate: Option<f64>,

    /// Stop once captured notional exceeds this
    #[arg(long)]
    pub target_notional: Option<f64>,

    /// Fee on captured notional, basis points
    #[arg(long)]
    pub fee_rate_bps: Option<u32>,

    /// Maximum number of trades to read
    #[arg(long)]
    pub row_limit: Option<usize>,

    /// Stop accumulating at the target instead of scanning every row
    #[arg(long)]
    pub early_exit: bool,

    /// Skip the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Delete cached results before running
    #[arg(long)]
    pub clear_cache: bool,

    /// Write the result rows to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CommonArgs {
    /// Load the config file and environment, then apply flag overrides
    pub fn load_config(&self) -> Result<RunConfig> {
        let mut cfg = RunConfig::load(self.config.as_deref())?;
        self.apply(&mut cfg)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overwrite config fields with the flags that were given
    pub fn apply(&self, cfg: &mut RunConfig) -> Result<()> {
        if let Some(data) = &self.data {
            cfg.data_path = Some(data.clone());
        }
        if let Some(side) = self.side {
            cfg.side = Side::try_from(side).map_err(|e| anyhow!(e))?;
        }
        if let Some(exponent) = self.downsample_exponent {
            cfg.downsample_exponent = exponent;
        }
        if let Some(start_date) = &self.start_date {
            cfg.start_date = start_date.clone();
        }
        if let Some(rate) = self.target_participation_rate {
            cfg.target_participation_rate = rate;
        }
        if let Some(notional) = self.target_notional {
            cfg.target_notional = notional;
        }
        if let Some(fee) = self.fee_rate_bps {
            cfg.fee_rate_bps = fee;
        }
        if let Some(limit) = self.row_limit {
            cfg.row_limit = limit;
        }
        if self.early_exit {
            cfg.early_exit = true;
        }
        if self.no_cache {
            cfg.cache.enabled = false;
        }
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }
        if self.json_logs {
            cfg.logging.json = true;
        }
        Ok(())
    }
}

/// Initialize tracing/logging
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    tally_core::utils::init_logger(&logging.level, logging.json)
}

/// Empty the configured cache directory
///
/// Runs whether or not caching is enabled for this run, so `--clear-cache
/// --no-cache` still removes stale entries.
pub fn clear_cache(cfg: &RunConfig) -> Result<usize> {
    let cache = ResultCache::new(&cfg.cache.dir);
    if !cfg.cache.enabled {
        tracing::warn!(
            dir = %cache.dir().display(),
            "Caching is disabled for this run; clearing the cache directory anyway"
        );
    }
    cache.clear()
}

/// Process exit code for a failed run
///
/// 2: not enough data to reach the target, 3: VWAP check failed, 1: anything else
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<RunError>()
        .map_or(1, |run_err| run_err.exit_code() as u8)
}
