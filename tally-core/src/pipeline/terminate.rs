//! Target-notional termination
//!
//! The run ends on the first row whose cumulative captured notional strictly
//! exceeds the target. That row is included. If no row gets there, the input
//! was too short and the run fails with `InsufficientData`.

use super::accumulate::{AccumulationParams, Accumulator};
use crate::core::{fixed_point, AccumulatedTrade, QualifiedTrade, RunError};
use tracing::debug;

/// Index of the first row whose cumulative notional exceeds `target_notional`
/// (currency units).
pub fn target_crossing(rows: &[AccumulatedTrade], target_notional: f64) -> Option<usize> {
    let target = fixed_point::notional_from_f64(target_notional);
    rows.iter().position(|row| row.cum_notional as i128 > target)
}

/// Trim an accumulated sequence at the target crossing (inclusive).
pub fn trim(
    mut rows: Vec<AccumulatedTrade>,
    target_notional: f64,
) -> Result<Vec<AccumulatedTrade>, RunError> {
    match target_crossing(&rows, target_notional) {
        Some(idx) => {
            debug!(rows = rows.len(), kept = idx + 1, "Trimmed at target notional");
            rows.truncate(idx + 1);
            Ok(rows)
        }
        None => Err(insufficient(rows.last(), target_notional)),
    }
}

/// Accumulate and stop at the target crossing in one pass.
///
/// Yields the same rows as `accumulate` followed by `trim` whenever that
/// succeeds. Rows after the crossing are never examined.
pub fn run_until_target(
    trades: &[QualifiedTrade],
    params: &AccumulationParams,
    target_notional: f64,
) -> Result<Vec<AccumulatedTrade>, RunError> {
    let target = fixed_point::notional_from_f64(target_notional);
    let mut acc = Accumulator::new(params);
    let mut rows = Vec::new();

    for trade in trades {
        let row = acc.push(trade)?;
        let crossed = row.cum_notional as i128 > target;
        rows.push(row);
        if crossed {
            debug!(rows = trades.len(), kept = acc.rows(), "Stopped at target notional");
            return Ok(rows);
        }
    }

    Err(insufficient(rows.last(), target_notional))
}

fn insufficient(last: Option<&AccumulatedTrade>, target_notional: f64) -> RunError {
    RunError::InsufficientData {
        traded_notional: last.map_or(0.0, AccumulatedTrade::cum_notional_currency),
        target_notional,
    }
}
