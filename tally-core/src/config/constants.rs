//! Default run parameters
//!
//! These mirror the reference run: buy side, millisecond buckets, 1% of
//! qualified volume, stop at one million of notional, 50 bps fees.

use crate::core::Side;

// ===== STRATEGY =====

/// Direction the strategy accumulates
pub const DEFAULT_SIDE: Side = Side::Buy;

/// Bucket coarseness: 1e6 ns
pub const DEFAULT_DOWNSAMPLE_EXPONENT: u32 = crate::pipeline::bucket::DEFAULT_EXPONENT;

/// Share of each qualified same-side trade captured
pub const DEFAULT_TARGET_PARTICIPATION_RATE: f64 = 0.01;

/// Captured notional (currency units) at which the run stops
pub const DEFAULT_TARGET_NOTIONAL: f64 = 1_000_000.0;

// ===== FEES =====

/// Fee on captured notional, basis points
pub const DEFAULT_FEE_RATE_BPS: u32 = 50;

/// Upper bound accepted by validation (100%)
pub const MAX_FEE_RATE_BPS: u32 = 10_000;

// ===== INPUT =====

/// Earliest trade considered
pub const DEFAULT_START_DATE: &str = "1970-01-01";

/// Maximum trades pulled from the file
pub const DEFAULT_ROW_LIMIT: usize = 100_000;

// ===== CACHE =====

/// Directory holding memoized run results
pub const DEFAULT_CACHE_DIR: &str = "data/memoize";
