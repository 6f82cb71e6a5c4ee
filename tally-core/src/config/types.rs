use super::constants::*;
use crate::core::Side;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Trade file to load
    pub data_path: Option<PathBuf>,

    /// Strategy direction: 1 (buy) or -1 (sell)
    pub side: Side,

    /// Bucket coarseness passed to the bucketizer
    pub downsample_exponent: u32,

    /// Lower bound on trade timestamps (`YYYY-MM-DD` or RFC 3339)
    pub start_date: String,

    /// Fraction of each qualified same-side trade captured
    pub target_participation_rate: f64,

    /// Captured notional at which the run stops (currency units)
    pub target_notional: f64,

    /// Fee on captured notional (basis points)
    pub fee_rate_bps: u32,

    /// Maximum trades considered
    pub row_limit: usize,

    /// Stop accumulating at the target crossing
    pub early_exit: bool,

    pub cache: CacheConfig,

    pub logging: LoggingConfig,
}

/// Result memoization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Enable JSON logging
    pub json: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            side: DEFAULT_SIDE,
            downsample_exponent: DEFAULT_DOWNSAMPLE_EXPONENT,
            start_date: DEFAULT_START_DATE.to_string(),
            target_participation_rate: DEFAULT_TARGET_PARTICIPATION_RATE,
            target_notional: DEFAULT_TARGET_NOTIONAL,
            fee_rate_bps: DEFAULT_FEE_RATE_BPS,
            row_limit: DEFAULT_ROW_LIMIT,
            early_exit: false,
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
