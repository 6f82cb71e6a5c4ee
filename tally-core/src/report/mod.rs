//! Run summary and CSV export

use crate::core::{fixed_point, AccumulatedTrade, Side};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Headline numbers of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub side: Side,
    pub rows: usize,
    pub first_timestamp_ns: i64,
    pub last_timestamp_ns: i64,
    /// Captured size in units
    pub captured_size: f64,
    /// Captured notional in currency units
    pub captured_notional: f64,
    /// Fees in currency units
    pub fees: f64,
    pub strategy_vwap: Option<f64>,
    pub market_vwap: f64,
    /// Strategy VWAP against market VWAP in basis points, positive when the
    /// strategy did worse than the market for its side
    pub slippage_bps: Option<f64>,
    /// Bucketed nanoseconds from the first trade to the last
    pub elapsed_ns: i64,
}

impl RunSummary {
    /// Summarize a run. `None` for an empty result.
    pub fn from_rows(side: Side, rows: &[AccumulatedTrade]) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;

        let slippage_bps = last.cum_vwap.map(|vwap| {
            side.sign() as f64 * (vwap - last.market_vwap) / last.market_vwap
                * fixed_point::BPS_SCALE as f64
        });

        Some(Self {
            side,
            rows: rows.len(),
            first_timestamp_ns: first.timestamp_ns(),
            last_timestamp_ns: last.timestamp_ns(),
            captured_size: fixed_point::size_to_f64(last.cum_target_participation),
            captured_notional: last.cum_notional_currency(),
            fees: fixed_point::notional_to_f64(last.cum_fees),
            strategy_vwap: last.cum_vwap,
            market_vwap: last.market_vwap,
            slippage_bps,
            elapsed_ns: last.since_arrival,
        })
    }

    /// Print the summary through tracing
    pub fn log(&self) {
        info!("=== Accumulation Summary ===");
        info!("Side: {}", self.side);
        info!("Trades consumed: {}", self.rows);
        info!("Captured size: {:.9}", self.captured_size);
        info!("Captured notional: {:.2}", self.captured_notional);
        info!("Fees: {:.2}", self.fees);
        match self.strategy_vwap {
            Some(vwap) => info!("Strategy VWAP: {:.6}", vwap),
            None => info!("Strategy VWAP: n/a"),
        }
        info!("Market VWAP: {:.6}", self.market_vwap);
        if let Some(slippage) = self.slippage_bps {
            info!("Slippage vs market: {:.2} bps", slippage);
        }
        info!("Elapsed: {:.3}s", self.elapsed_ns as f64 / 1e9);
    }
}

/// Flat CSV layout of an [`AccumulatedTrade`]
#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp_ns: i64,
    bucket_id: i64,
    side: i8,
    price_millionths: i64,
    size_billionths: i64,
    is_qualified: bool,
    cum_volume_side: i64,
    cum_volume_all: i64,
    cum_volume_qualified: i64,
    target_participation: i64,
    cum_target_participation: i64,
    notional: i64,
    cum_notional: i64,
    cum_vwap: Option<f64>,
    fees: i64,
    cum_fees: i64,
    market_vwap: f64,
    since_arrival: i64,
}

impl From<&AccumulatedTrade> for CsvRow {
    fn from(row: &AccumulatedTrade) -> Self {
        Self {
            timestamp_ns: row.trade.timestamp_ns,
            bucket_id: row.bucket_id,
            side: row.trade.side.sign(),
            price_millionths: row.trade.price_millionths,
            size_billionths: row.trade.size_billionths,
            is_qualified: row.is_qualified,
            cum_volume_side: row.cum_volume_side,
            cum_volume_all: row.cum_volume_all,
            cum_volume_qualified: row.cum_volume_qualified,
            target_participation: row.target_participation,
            cum_target_participation: row.cum_target_participation,
            notional: row.notional,
            cum_notional: row.cum_notional,
            cum_vwap: row.cum_vwap,
            fees: row.fees,
            cum_fees: row.cum_fees,
            market_vwap: row.market_vwap,
            since_arrival: row.since_arrival,
        }
    }
}

/// Write one CSV record per row, with a header
pub fn write_csv<W: Write>(writer: W, rows: &[AccumulatedTrade]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(CsvRow::from(row))
            .context("Failed to write CSV record")?;
    }
    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(path: P, rows: &[AccumulatedTrade]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_csv(file, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote results");
    Ok(())
}
