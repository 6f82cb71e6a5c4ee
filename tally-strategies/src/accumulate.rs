//! Participation-rate accumulation strategy
//!
//! [`AccumulateRunner`] fixes the side and bucket exponent, then runs the
//! pipeline for any trade file and set of [`RunOptions`]. Loading and the
//! run itself are memoized separately: rerunning with a different target
//! reuses the parsed tape.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tally_core::cache::ResultCache;
use tally_core::config::{self, RunConfig};
use tally_core::data::{self, LoadParams, TradeTape};
use tally_core::pipeline::bucket::{MAX_EXPONENT, MIN_EXPONENT};
use tally_core::pipeline::{self, RunParams};
use tally_core::{AccumulatedTrade, Side};
use thiserror::Error;
use tracing::{debug, info};

const TRADES_NAMESPACE: &str = "accumulate_trades";
const RUN_NAMESPACE: &str = "accumulate_run";

/// Strategy construction and input errors
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("downsample exponent {exponent} must be within {min}..={max}")]
    InvalidExponent { exponent: u32, min: u32, max: u32 },

    #[error("cannot stat trade file {path:?}: {source}")]
    TradeFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-run arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Lower bound on trade timestamps (`YYYY-MM-DD` or RFC 3339)
    pub start_date: String,
    pub target_participation_rate: f64,
    /// Currency units
    pub target_notional: f64,
    pub fee_rate_bps: u32,
    pub row_limit: usize,
    pub early_exit: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for RunOptions {
    fn from(cfg: &RunConfig) -> Self {
        Self {
            start_date: cfg.start_date.clone(),
            target_participation_rate: cfg.target_participation_rate,
            target_notional: cfg.target_notional,
            fee_rate_bps: cfg.fee_rate_bps,
            row_limit: cfg.row_limit,
            early_exit: cfg.early_exit,
        }
    }
}

/// Size and modification time, so an edited trade file misses the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct FileStamp {
    len: u64,
    modified_ms: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, StrategyError> {
        let meta = std::fs::metadata(path).map_err(|source| StrategyError::TradeFile {
            path: path.to_path_buf(),
            source,
        })?;
        let modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as u64);

        Ok(Self {
            len: meta.len(),
            modified_ms,
        })
    }
}

#[derive(Debug, Serialize)]
struct TradesKey<'a> {
    path: &'a Path,
    file: FileStamp,
    side: Side,
    start_ns: i64,
    row_limit: usize,
}

#[derive(Debug, Serialize)]
struct RunKey<'a> {
    path: &'a Path,
    file: FileStamp,
    side: Side,
    downsample_exponent: u32,
    options: &'a RunOptions,
}

/// Accumulation strategy for one side and bucket exponent
#[derive(Debug, Clone)]
pub struct AccumulateRunner {
    side: Side,
    downsample_exponent: u32,
    cache: Option<ResultCache>,
}

impl AccumulateRunner {
    /// Runner without a cache
    pub fn new(side: Side, downsample_exponent: u32) -> Result<Self, StrategyError> {
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&downsample_exponent) {
            return Err(StrategyError::InvalidExponent {
                exponent: downsample_exponent,
                min: MIN_EXPONENT,
                max: MAX_EXPONENT,
            });
        }

        Ok(Self {
            side,
            downsample_exponent,
            cache: None,
        })
    }

    /// Runner for the configured side and exponent, with the configured cache
    pub fn from_config(cfg: &RunConfig) -> Result<Self> {
        let runner = Self::new(cfg.side, cfg.downsample_exponent)?;
        Ok(if cfg.cache.enabled {
            runner.with_cache(ResultCache::new(&cfg.cache.dir))
        } else {
            runner
        })
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn downsample_exponent(&self) -> u32 {
        self.downsample_exponent
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    pub fn run_params(&self, options: &RunOptions) -> RunParams {
        RunParams {
            side: self.side,
            downsample_exponent: self.downsample_exponent,
            target_participation_rate: options.target_participation_rate,
            target_notional: options.target_notional,
            fee_rate_bps: options.fee_rate_bps,
            early_exit: options.early_exit,
        }
    }

    /// Load, sort and filter the trade file for this runner's side.
    pub fn load_trades<P: AsRef<Path>>(
        &self,
        path: P,
        start_ns: i64,
        row_limit: usize,
    ) -> Result<TradeTape> {
        let path = path.as_ref();
        let params = LoadParams {
            side: self.side,
            start_ns,
            row_limit,
        };
        let load = || {
            data::load_trades(path, &params)
                .with_context(|| format!("Failed to load trades from {:?}", path))
        };

        match &self.cache {
            Some(cache) => {
                let key = TradesKey {
                    path,
                    file: FileStamp::of(path)?,
                    side: self.side,
                    start_ns,
                    row_limit,
                };
                cache.get_or_compute(TRADES_NAMESPACE, &key, load)
            }
            None => load(),
        }
    }

    /// Run the accumulation strategy over a trade file.
    ///
    /// Pipeline failures keep their [`tally_core::RunError`] type inside the
    /// returned error and can be recovered with `downcast_ref`.
    pub fn run_accumulate_strat<P: AsRef<Path>>(
        &self,
        path: P,
        options: &RunOptions,
    ) -> Result<Vec<AccumulatedTrade>> {
        let path = path.as_ref();
        self.checked_config(options).validate()?;
        let start_ns = config::parse_start_date(&options.start_date)?;
        let params = self.run_params(options);

        info!(
            path = %path.display(),
            side = %self.side,
            downsample_exponent = self.downsample_exponent,
            target_notional = options.target_notional,
            cached = self.cache.is_some(),
            "Running accumulation strategy"
        );

        let compute = || -> Result<Vec<AccumulatedTrade>> {
            let tape = self.load_trades(path, start_ns, options.row_limit)?;
            debug!(rows = tape.len(), total_rows = tape.total_rows, "Loaded tape");
            Ok(pipeline::run(&tape.trades(), &params)?)
        };

        match &self.cache {
            Some(cache) => {
                let key = RunKey {
                    path,
                    file: FileStamp::of(path)?,
                    side: self.side,
                    downsample_exponent: self.downsample_exponent,
                    options,
                };
                cache.get_or_compute(RUN_NAMESPACE, &key, compute)
            }
            None => compute(),
        }
    }

    /// The options expressed as a config, for validation
    fn checked_config(&self, options: &RunOptions) -> RunConfig {
        RunConfig {
            side: self.side,
            downsample_exponent: self.downsample_exponent,
            start_date: options.start_date.clone(),
            target_participation_rate: options.target_participation_rate,
            target_notional: options.target_notional,
            fee_rate_bps: options.fee_rate_bps,
            row_limit: options.row_limit,
            early_exit: options.early_exit,
            ..RunConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use approx::assert_relative_eq;
    use tally_core::RunError;

    fn options(target_notional: f64) -> RunOptions {
        RunOptions {
            target_participation_rate: 0.5,
            target_notional,
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_rejects_bad_exponent() {
        assert!(matches!(
            AccumulateRunner::new(Side::Buy, 0),
            Err(StrategyError::InvalidExponent { exponent: 0, .. })
        ));
        assert!(AccumulateRunner::new(Side::Buy, 18).is_err());
        assert!(AccumulateRunner::new(Side::Sell, 17).is_ok());
    }

    #[test]
    fn test_from_config_respects_cache_flag() {
        let mut cfg = RunConfig::default();
        assert!(AccumulateRunner::from_config(&cfg).unwrap().cache().is_some());
        cfg.cache.enabled = false;
        assert!(AccumulateRunner::from_config(&cfg).unwrap().cache().is_none());
    }

    #[test]
    fn test_run_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        let tape = bucketed_tape(Side::Buy, 5, &[100_000_000, 101_000_000]);
        let path = write_trade_file(dir.path(), "trades.txt", &tape);

        let runner = AccumulateRunner::new(Side::Buy, 6).unwrap();
        let rows = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();

        // 50.5 captured per bucket, on the 101.0 print
        assert_eq!(rows.len(), 6);
        assert_relative_eq!(rows[5].cum_notional_currency(), 151.5);
        assert!(!rows[4].is_qualified);
    }

    #[test]
    fn test_run_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("memoize");
        let tape = bucketed_tape(Side::Buy, 5, &[100_000_000, 101_000_000]);
        let path = write_trade_file(dir.path(), "trades.txt", &tape);

        let runner = AccumulateRunner::new(Side::Buy, 6)
            .unwrap()
            .with_cache(ResultCache::new(&cache_dir));

        let first = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();
        assert_eq!(cache_entries(&cache_dir), 2);

        let second = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache_entries(&cache_dir), 2);

        // A new target reuses the loaded tape
        runner.run_accumulate_strat(&path, &options(200.0)).unwrap();
        assert_eq!(cache_entries(&cache_dir), 3);
    }

    #[test]
    fn test_edited_file_misses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("memoize");
        let runner = AccumulateRunner::new(Side::Buy, 6)
            .unwrap()
            .with_cache(ResultCache::new(&cache_dir));

        let short = bucketed_tape(Side::Buy, 5, &[100_000_000, 101_000_000]);
        let path = write_trade_file(dir.path(), "trades.txt", &short);
        let before = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();

        let long = bucketed_tape(Side::Buy, 5, &[100_000_000, 101_000_000, 101_000_000]);
        write_trade_file(dir.path(), "trades.txt", &long);
        let after = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();

        assert_ne!(before, after);
        assert_eq!(cache_entries(&cache_dir), 4);
    }

    #[test]
    fn test_failed_run_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("memoize");
        let tape = bucketed_tape(Side::Buy, 2, &[100_000_000, 101_000_000]);
        let path = write_trade_file(dir.path(), "trades.txt", &tape);

        let runner = AccumulateRunner::new(Side::Buy, 6)
            .unwrap()
            .with_cache(ResultCache::new(&cache_dir));

        let err = runner.run_accumulate_strat(&path, &options(1_000.0)).unwrap_err();
        match err.downcast_ref::<RunError>() {
            Some(RunError::InsufficientData {
                traded_notional, ..
            }) => assert_relative_eq!(*traded_notional, 101.0),
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        // Only the tape was stored
        assert_eq!(cache_entries(&cache_dir), 1);
    }

    #[test]
    fn test_invalid_options_fail_before_loading() {
        let runner = AccumulateRunner::new(Side::Buy, 6).unwrap();
        let bad = RunOptions {
            target_participation_rate: 0.0,
            ..RunOptions::default()
        };
        let err = runner.run_accumulate_strat("does-not-exist.txt", &bad).unwrap_err();
        assert!(format!("{:#}", err).contains("target_participation_rate"));
    }

    #[test]
    fn test_missing_file() {
        let runner = AccumulateRunner::new(Side::Buy, 6)
            .unwrap()
            .with_cache(ResultCache::new(std::env::temp_dir().join("tally-missing")));
        let err = runner
            .run_accumulate_strat("does-not-exist.txt", &options(1.0))
            .unwrap_err();
        assert!(err.downcast_ref::<StrategyError>().is_some());
    }

    #[test]
    fn test_sell_runner_captures_bucket_lows() {
        let dir = tempfile::tempdir().unwrap();
        // Single-print buckets keep the market VWAP equal to the strategy VWAP
        let tape = bucketed_tape(Side::Sell, 4, &[100_000_000]);
        let path = write_trade_file(dir.path(), "sells.txt", &tape);

        let runner = AccumulateRunner::new(Side::Sell, 6).unwrap();
        let rows = runner.run_accumulate_strat(&path, &options(120.0)).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.trade.side == Side::Sell));
        assert_relative_eq!(rows[2].cum_vwap.unwrap(), 100.0);
    }
}
