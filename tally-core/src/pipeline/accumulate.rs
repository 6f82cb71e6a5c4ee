//! Running accumulation over qualified trades
//!
//! [`Accumulator`] is a streaming fold: each pushed trade yields one
//! [`AccumulatedTrade`] carrying the strategy's running totals after that
//! trade. [`accumulate`] drives it over a whole sequence.
//!
//! ## Numerics
//! All totals are integers at the input scales. The participation rate is
//! converted once to 9-decimal fixed point. VWAP numerators are kept exactly
//! as `i128` (`size * price`, scale 1e15); only the reported VWAPs are `f64`.
//!
//! ## Invariant
//! After every row with at least one capture, the side-agnostic market VWAP
//! must not exceed the strategy VWAP. The comparison is done on the exact
//! fractions, so equal prices never trip it through float rounding.

use crate::core::{fixed_point, AccumulatedTrade, DataIntegrityError, QualifiedTrade, RunError, Side};

/// Strategy parameters for one accumulation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulationParams {
    /// Direction the strategy trades
    pub side: Side,
    /// Fraction of each qualified same-side trade captured, in `(0, 1]`
    pub target_prt_rate: f64,
    /// Fee on captured notional, basis points
    pub fee_rate_bps: u32,
}

/// Streaming accumulation state
#[derive(Debug, Clone)]
pub struct Accumulator {
    side: Side,
    rate_fixed: i64,
    fee_rate_bps: u32,

    rows: usize,
    first_bucket: Option<i64>,

    cum_volume_same: i64,
    cum_volume_opposite: i64,
    cum_volume_all: i64,
    cum_volume_qualified: i64,
    cum_target: i64,
    cum_notional: i64,
    cum_fees: i64,

    /// Σ target_participation × price (scale 1e15)
    strategy_raw: i128,
    /// Σ size × price over every trade (scale 1e15)
    market_raw: i128,
}

impl Accumulator {
    pub fn new(params: &AccumulationParams) -> Self {
        Self {
            side: params.side,
            rate_fixed: fixed_point::rate_from_f64(params.target_prt_rate),
            fee_rate_bps: params.fee_rate_bps,
            rows: 0,
            first_bucket: None,
            cum_volume_same: 0,
            cum_volume_opposite: 0,
            cum_volume_all: 0,
            cum_volume_qualified: 0,
            cum_target: 0,
            cum_notional: 0,
            cum_fees: 0,
            strategy_raw: 0,
            market_raw: 0,
        }
    }

    /// Rows consumed so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Fold one trade into the running state.
    ///
    /// # Errors
    /// - `RunError::InvariantViolation` when the market VWAP rises above the
    ///   strategy VWAP after this trade.
    /// - `DataIntegrityError::ArithmeticOverflow` when a total leaves i64. The
    ///   state is left as it was before the call.
    pub fn push(&mut self, qualified: &QualifiedTrade) -> Result<AccumulatedTrade, RunError> {
        let trade = &qualified.trade;
        let size = trade.size_billionths;
        let same_side = trade.side == self.side;
        let first_bucket = *self.first_bucket.get_or_insert(qualified.bucket_id);

        let ts = trade.timestamp_ns;

        // New totals are computed first and committed only once all of them fit
        let (cum_volume_same, cum_volume_opposite) = if same_side {
            let total = checked(self.cum_volume_same.checked_add(size), ts, "cum_volume_side")?;
            (total, self.cum_volume_opposite)
        } else {
            let total = checked(self.cum_volume_opposite.checked_add(size), ts, "cum_volume_side")?;
            (self.cum_volume_same, total)
        };
        let cum_volume_all = checked(self.cum_volume_all.checked_add(size), ts, "cum_volume_all")?;
        let market_raw = checked(
            self.market_raw.checked_add(trade.raw_notional()),
            ts,
            "market_vwap",
        )?;

        let captures = same_side && qualified.is_qualified;
        let (target_participation, notional, fees, raw) = if captures {
            let target = checked(
                fixed_point::apply_rate(size, self.rate_fixed),
                ts,
                "target_participation",
            )?;
            let raw = target as i128 * trade.price_millionths as i128;
            (
                target,
                checked(fixed_point::raw_to_notional(raw), ts, "notional")?,
                checked(fixed_point::fee_from_raw(raw, self.fee_rate_bps), ts, "fees")?,
                raw,
            )
        } else {
            (0, 0, 0, 0)
        };

        let cum_volume_qualified = if captures {
            checked(self.cum_volume_qualified.checked_add(size), ts, "cum_volume_qualified")?
        } else {
            self.cum_volume_qualified
        };
        let cum_target = checked(
            self.cum_target.checked_add(target_participation),
            ts,
            "cum_target_participation",
        )?;
        let cum_notional = checked(self.cum_notional.checked_add(notional), ts, "cum_notional")?;
        let cum_fees = checked(self.cum_fees.checked_add(fees), ts, "cum_fees")?;
        let strategy_raw = checked(self.strategy_raw.checked_add(raw), ts, "cum_vwap")?;

        self.cum_volume_same = cum_volume_same;
        self.cum_volume_opposite = cum_volume_opposite;
        self.cum_volume_all = cum_volume_all;
        self.market_raw = market_raw;
        self.cum_volume_qualified = cum_volume_qualified;
        self.cum_target = cum_target;
        self.cum_notional = cum_notional;
        self.cum_fees = cum_fees;
        self.strategy_raw = strategy_raw;

        let cum_volume_side = if same_side { cum_volume_same } else { cum_volume_opposite };

        let market_vwap = fixed_point::vwap(self.market_raw, self.cum_volume_all);
        let cum_vwap = (self.cum_target > 0)
            .then(|| fixed_point::vwap(self.strategy_raw, self.cum_target));

        let row = self.rows;
        self.rows += 1;

        if let Some(cum_vwap) = cum_vwap {
            if self.market_exceeds_strategy(market_vwap, cum_vwap) {
                return Err(RunError::InvariantViolation {
                    row,
                    timestamp_ns: trade.timestamp_ns,
                    market_vwap,
                    cum_vwap,
                });
            }
        }

        Ok(AccumulatedTrade {
            trade: *trade,
            bucket_id: qualified.bucket_id,
            is_qualified: qualified.is_qualified,
            cum_volume_side,
            cum_volume_all: self.cum_volume_all,
            cum_volume_qualified: self.cum_volume_qualified,
            target_participation,
            cum_target_participation: self.cum_target,
            notional,
            cum_notional: self.cum_notional,
            cum_vwap,
            fees,
            cum_fees: self.cum_fees,
            market_vwap,
            since_arrival: qualified.bucket_id - first_bucket,
        })
    }

    /// `market_raw / cum_volume_all > strategy_raw / cum_target`, compared by
    /// cross-multiplication. Falls back to the float VWAPs if the products
    /// overflow i128.
    fn market_exceeds_strategy(&self, market_vwap: f64, cum_vwap: f64) -> bool {
        let lhs = self.market_raw.checked_mul(self.cum_target as i128);
        let rhs = self.strategy_raw.checked_mul(self.cum_volume_all as i128);
        match (lhs, rhs) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => market_vwap > cum_vwap,
        }
    }
}

fn checked<T>(value: Option<T>, timestamp_ns: i64, quantity: &'static str) -> Result<T, DataIntegrityError> {
    value.ok_or(DataIntegrityError::ArithmeticOverflow {
        timestamp_ns,
        quantity,
    })
}

/// Accumulate a whole qualified sequence.
///
/// Aborts on the first invariant violation; there is no partial result.
pub fn accumulate(
    trades: &[QualifiedTrade],
    params: &AccumulationParams,
) -> Result<Vec<AccumulatedTrade>, RunError> {
    let mut acc = Accumulator::new(params);
    trades.iter().map(|trade| acc.push(trade)).collect()
}
