//! Accumulation pipeline
//!
//! raw trades → [`bucket`] → [`qualify`] → [`accumulate`] → [`terminate`]
//!
//! Every stage is a pure function of its inputs. A run holds the whole
//! (row-limited) sequence in memory and either returns the trimmed result or
//! fails with no partial output.

pub mod accumulate;
pub mod bucket;
pub mod qualify;
pub mod terminate;

pub use accumulate::{accumulate, AccumulationParams, Accumulator};
pub use bucket::bucketize;
pub use qualify::{mark, qualify};
pub use terminate::{run_until_target, target_crossing, trim};

use crate::core::{AccumulatedTrade, DataIntegrityError, RunError, Side, Trade};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters of one simulation run over an already-loaded trade sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub side: Side,
    pub downsample_exponent: u32,
    pub target_participation_rate: f64,
    /// Captured notional (currency units) at which the run stops
    pub target_notional: f64,
    pub fee_rate_bps: u32,
    /// Stop accumulating at the target crossing instead of scanning every row
    #[serde(default)]
    pub early_exit: bool,
}

impl RunParams {
    pub fn accumulation(&self) -> AccumulationParams {
        AccumulationParams {
            side: self.side,
            target_prt_rate: self.target_participation_rate,
            fee_rate_bps: self.fee_rate_bps,
        }
    }
}

/// Run the full pipeline over a time-ordered trade sequence.
pub fn run(trades: &[Trade], params: &RunParams) -> Result<Vec<AccumulatedTrade>, RunError> {
    if trades.is_empty() {
        return Err(DataIntegrityError::EmptyInput.into());
    }

    let qualified = qualify(trades, params.side, params.downsample_exponent)?;
    let accumulation = params.accumulation();

    let rows = if params.early_exit {
        run_until_target(&qualified, &accumulation, params.target_notional)?
    } else {
        let rows = accumulate(&qualified, &accumulation)?;
        debug!(rows = rows.len(), "Accumulated full sequence");
        trim(rows, params.target_notional)?
    };

    info!(
        side = %params.side,
        input = trades.len(),
        output = rows.len(),
        target_notional = params.target_notional,
        "Accumulation run reached target"
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: i64 = 1_000_000_000;
    const T0: i64 = 1_700_000_000_000_000_000;

    fn params(early_exit: bool) -> RunParams {
        RunParams {
            side: Side::Buy,
            downsample_exponent: 6,
            target_participation_rate: 0.5,
            target_notional: 2_500.0,
            fee_rate_bps: 50,
            early_exit,
        }
    }

    /// One trade per 10ms bucket, 1 unit @ 1000.0
    fn tape(n: i64) -> Vec<Trade> {
        (0..n)
            .map(|i| Trade::new(T0 + i * 10_000_000, Side::Buy, 1_000_000_000, ONE))
            .collect()
    }

    #[test]
    fn test_run_trims_at_target() {
        // 500 captured per row: crossing 2500 needs six rows
        for early_exit in [false, true] {
            let rows = run(&tape(20), &params(early_exit)).unwrap();
            assert_eq!(rows.len(), 6);
            assert_eq!(rows[5].since_arrival, 50_000_000);
        }
    }

    #[test]
    fn test_run_empty_input() {
        let err = run(&[], &params(false)).unwrap_err();
        assert!(matches!(err, RunError::DataIntegrity(DataIntegrityError::EmptyInput)));
    }

    #[test]
    fn test_run_insufficient() {
        let err = run(&tape(3), &params(false)).unwrap_err();
        assert!(matches!(err, RunError::InsufficientData { .. }));
    }
}
