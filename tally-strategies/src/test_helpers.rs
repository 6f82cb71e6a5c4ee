//! Test helpers for building trade tapes and trade files
//!
//! Tapes use 10ms buckets starting at a fixed 2023 timestamp, with prints
//! spaced 100µs apart inside a bucket so they all share one bucket id at the
//! default exponent.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tally_core::data::{PRICE_COLUMN, RECEIVED_COLUMN, SIDE_COLUMN, SIZE_COLUMN, TIMESTAMP_COLUMN};
use tally_core::{Side, Trade};

pub const T0: i64 = 1_700_000_000_000_000_000;
pub const BUCKET_NS: i64 = 10_000_000;
pub const STEP_NS: i64 = 100_000;
pub const ONE: i64 = 1_000_000_000;

/// One trade per (bucket, price) pair, one unit each
///
/// # Example
/// ```ignore
/// // two buckets, each printing 100.0 then 101.0
/// let tape = bucketed_tape(Side::Buy, 2, &[100_000_000, 101_000_000]);
/// ```
pub fn bucketed_tape(side: Side, buckets: usize, prices: &[i64]) -> Vec<Trade> {
    assert!(prices.len() <= 9, "at most nine prints fit in one bucket");

    (0..buckets as i64)
        .flat_map(|k| {
            prices.iter().enumerate().map(move |(j, &price)| {
                Trade::new(T0 + k * BUCKET_NS + (j as i64 + 1) * STEP_NS, side, price, ONE)
            })
        })
        .collect()
}

/// Write trades as a whitespace-delimited trade file
pub fn write_trade_file(dir: &Path, name: &str, trades: &[Trade]) -> PathBuf {
    let mut text = format!(
        "{} {} {} {} {}\n",
        RECEIVED_COLUMN, TIMESTAMP_COLUMN, PRICE_COLUMN, SIZE_COLUMN, SIDE_COLUMN
    );
    for t in trades {
        writeln!(
            text,
            "{} {} {} {} {}",
            t.timestamp_ns + 1_000,
            t.timestamp_ns,
            t.price_millionths,
            t.size_billionths,
            t.side.sign()
        )
        .unwrap();
    }

    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Number of cache entries under `dir`
pub fn cache_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count(),
        Err(_) => 0,
    }
}
