use crate::core::{Side, Trade};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Required column: exchange timestamp in nanoseconds
pub const TIMESTAMP_COLUMN: &str = "timestamp_utc_nanoseconds";
/// Required column: `1`, `-1` or `0`
pub const SIDE_COLUMN: &str = "Side";
/// Required column: price scaled by 1e6
pub const PRICE_COLUMN: &str = "PriceMillionths";
/// Required column: size scaled by 1e9
pub const SIZE_COLUMN: &str = "SizeBillionths";
/// Local receive time, dropped on load
pub const RECEIVED_COLUMN: &str = "received_utc_nanoseconds";

/// Trade row as read from the file, before validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTrade {
    pub timestamp_ns: i64,
    pub side: i64,
    pub price_millionths: i64,
    pub size_billionths: i64,
}

/// A loaded trade plus any columns the schema does not know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRow {
    pub trade: Trade,
    /// Unrecognised columns by header name, values kept verbatim
    pub extra: BTreeMap<String, String>,
}

/// Filters applied after parsing and sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadParams {
    /// Keep only trades on this side
    pub side: Side,
    /// Drop trades before this timestamp
    pub start_ns: i64,
    /// Keep at most this many trades
    pub row_limit: usize,
}

/// Sorted, filtered trades from one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTape {
    pub rows: Vec<TradeRow>,
    /// Names of the extension columns, in header order
    pub extra_columns: Vec<String>,
    /// Rows in the file before filtering
    pub total_rows: usize,
}

impl TradeTape {
    pub fn trades(&self) -> Vec<Trade> {
        self.rows.iter().map(|row| row.trade).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
