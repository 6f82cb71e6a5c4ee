//! Core record types for the accumulation pipeline
//!
//! Every stage produces a new, augmented record instead of mutating its input:
//! `Trade` → `QualifiedTrade` → `AccumulatedTrade`.
//!
//! Prices are millionths and sizes are billionths (see [`fixed_point`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction
///
/// Serialized as its sign (`1` / `-1`), matching the `Side` column of the
/// trade files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
#[repr(i8)]
pub enum Side {
    Buy = 1,
    Sell = -1,
}

impl Side {
    /// +1 for Buy, -1 for Sell
    #[inline(always)]
    pub const fn sign(self) -> i8 {
        self as i8
    }

    /// Map a raw side value to a direction. `0` and anything else is `None`.
    #[inline]
    pub const fn from_sign(value: i64) -> Option<Self> {
        match value {
            1 => Some(Side::Buy),
            -1 => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl From<Side> for i8 {
    fn from(side: Side) -> Self {
        side.sign()
    }
}

impl TryFrom<i8> for Side {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Side::from_sign(value as i64).ok_or_else(|| format!("invalid side {}, expected 1 or -1", value))
    }
}

/// One recorded trade execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange timestamp in nanoseconds since the epoch
    pub timestamp_ns: i64,
    pub side: Side,
    /// Price scaled by 1e6
    pub price_millionths: i64,
    /// Size scaled by 1e9
    pub size_billionths: i64,
}

impl Trade {
    pub const fn new(timestamp_ns: i64, side: Side, price_millionths: i64, size_billionths: i64) -> Self {
        Self {
            timestamp_ns,
            side,
            price_millionths,
            size_billionths,
        }
    }

    /// `size * price` at scale 1e15 (billionths × millionths)
    #[inline(always)]
    pub fn raw_notional(&self) -> i128 {
        self.size_billionths as i128 * self.price_millionths as i128
    }
}

/// A trade tagged with its bucket and whether it won its bucket on price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedTrade {
    pub trade: Trade,
    pub bucket_id: i64,
    pub is_qualified: bool,
}

/// A qualified trade with the strategy's running state after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedTrade {
    pub trade: Trade,
    pub bucket_id: i64,
    pub is_qualified: bool,

    /// Running size over trades with this row's side (billionths)
    pub cum_volume_side: i64,
    /// Running size over every trade (billionths)
    pub cum_volume_all: i64,
    /// Running size over qualified same-side trades (billionths)
    pub cum_volume_qualified: i64,

    /// Size captured on this trade (billionths)
    pub target_participation: i64,
    pub cum_target_participation: i64,

    /// Captured notional on this trade (billionths of currency)
    pub notional: i64,
    pub cum_notional: i64,

    /// Strategy VWAP in currency units, `None` until the first capture
    pub cum_vwap: Option<f64>,

    /// Fees on this trade (billionths of currency, truncated)
    pub fees: i64,
    pub cum_fees: i64,

    /// Side-agnostic VWAP over every trade so far, currency units
    pub market_vwap: f64,

    /// Bucket id minus the first bucket id of the run
    pub since_arrival: i64,
}

impl AccumulatedTrade {
    #[inline(always)]
    pub fn timestamp_ns(&self) -> i64 {
        self.trade.timestamp_ns
    }

    /// Cumulative captured notional in currency units
    #[inline]
    pub fn cum_notional_currency(&self) -> f64 {
        fixed_point::notional_to_f64(self.cum_notional)
    }
}

/// Fixed-point conversion utilities
///
/// Trade files carry prices in millionths and sizes in billionths. Products of
/// the two are kept as `i128` at scale 1e15 until a value leaves the pipeline.
pub mod fixed_point {
    /// Scale of `price_millionths`
    pub const PRICE_SCALE: i64 = 1_000_000;

    /// Scale of `size_billionths`, notional values and fractional rates
    pub const SIZE_SCALE: i64 = 1_000_000_000;

    /// Basis points per unit
    pub const BPS_SCALE: i64 = 10_000;

    /// Convert a fraction (e.g. a participation rate) to 9-decimal fixed point.
    ///
    /// Rounds to the nearest unit so `0.29` becomes `290_000_000` rather than
    /// `289_999_999`.
    #[inline]
    pub fn rate_from_f64(rate: f64) -> i64 {
        (rate * SIZE_SCALE as f64).round() as i64
    }

    /// `size * rate`, truncated toward zero. `None` if the result leaves i64.
    #[inline]
    pub fn apply_rate(size_billionths: i64, rate_fixed: i64) -> Option<i64> {
        let scaled = size_billionths as i128 * rate_fixed as i128 / SIZE_SCALE as i128;
        i64::try_from(scaled).ok()
    }

    /// Reduce a scale-1e15 product to billionths of currency, truncated.
    /// `None` if the result leaves i64.
    #[inline]
    pub fn raw_to_notional(raw: i128) -> Option<i64> {
        i64::try_from(raw / PRICE_SCALE as i128).ok()
    }

    /// Fee on a scale-1e15 notional, in billionths of currency, truncated toward zero.
    /// `None` on overflow.
    #[inline]
    pub fn fee_from_raw(raw: i128, fee_rate_bps: u32) -> Option<i64> {
        let fee = raw.checked_mul(fee_rate_bps as i128)? / (PRICE_SCALE as i128 * BPS_SCALE as i128);
        i64::try_from(fee).ok()
    }

    #[inline(always)]
    pub fn price_to_f64(price_millionths: i64) -> f64 {
        price_millionths as f64 / PRICE_SCALE as f64
    }

    #[inline(always)]
    pub fn size_to_f64(size_billionths: i64) -> f64 {
        size_billionths as f64 / SIZE_SCALE as f64
    }

    /// Billionths of currency to currency units
    #[inline(always)]
    pub fn notional_to_f64(notional_billionths: i64) -> f64 {
        notional_billionths as f64 / SIZE_SCALE as f64
    }

    /// Currency units to billionths of currency (rounded)
    #[inline]
    pub fn notional_from_f64(currency: f64) -> i128 {
        (currency * SIZE_SCALE as f64).round() as i128
    }

    /// VWAP in currency units from a scale-1e15 numerator and a billionths denominator
    #[inline]
    pub fn vwap(raw_numerator: i128, size_denominator: i64) -> f64 {
        raw_numerator as f64 / size_denominator as f64 / PRICE_SCALE as f64
    }
}
