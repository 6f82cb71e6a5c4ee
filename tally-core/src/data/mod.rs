//! Trade file loading
//!
//! Trade files are whitespace-delimited text with a header row:
//!
//! ```text
//! received_utc_nanoseconds timestamp_utc_nanoseconds PriceMillionths SizeBillionths Side
//! 1616236353418223936      1616236353417000000       58336410000     27000000       -1
//! ```
//!
//! Loading sorts rows by timestamp (stable), keeps the requested side, applies
//! the start bound and row limit, in that order. Columns other than the four
//! required ones (and the dropped receive time) are kept per row in
//! [`TradeRow::extra`].

pub mod types;
pub mod validator;

pub use types::{
    LoadParams, RawTrade, TradeRow, TradeTape, PRICE_COLUMN, RECEIVED_COLUMN, SIDE_COLUMN,
    SIZE_COLUMN, TIMESTAMP_COLUMN,
};

use crate::core::DataIntegrityError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Column positions resolved from the header row
#[derive(Debug)]
struct Header {
    width: usize,
    timestamp: usize,
    side: usize,
    price: usize,
    size: usize,
    extra: Vec<(usize, String)>,
}

impl Header {
    fn parse(line: &str) -> Result<Self, DataIntegrityError> {
        let names: Vec<&str> = line.split_whitespace().collect();
        let find = |column: &'static str| {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or(DataIntegrityError::MissingColumn { column })
        };

        let timestamp = find(TIMESTAMP_COLUMN)?;
        let side = find(SIDE_COLUMN)?;
        let price = find(PRICE_COLUMN)?;
        let size = find(SIZE_COLUMN)?;

        let known = [TIMESTAMP_COLUMN, SIDE_COLUMN, PRICE_COLUMN, SIZE_COLUMN, RECEIVED_COLUMN];
        let extra = names
            .iter()
            .enumerate()
            .filter(|(_, name)| !known.contains(*name))
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        Ok(Self {
            width: names.len(),
            timestamp,
            side,
            price,
            size,
            extra,
        })
    }

    fn parse_row(&self, line: usize, text: &str) -> Result<(RawTrade, BTreeMap<String, String>), DataIntegrityError> {
        let cells: Vec<&str> = text.split_whitespace().collect();
        if cells.len() != self.width {
            return Err(DataIntegrityError::MalformedRow {
                line,
                reason: format!("expected {} cells, found {}", self.width, cells.len()),
            });
        }

        let int = |idx: usize, column: &str| {
            cells[idx].parse::<i64>().map_err(|e| DataIntegrityError::MalformedRow {
                line,
                reason: format!("{} '{}': {}", column, cells[idx], e),
            })
        };

        let raw = RawTrade {
            timestamp_ns: int(self.timestamp, TIMESTAMP_COLUMN)?,
            side: int(self.side, SIDE_COLUMN)?,
            price_millionths: int(self.price, PRICE_COLUMN)?,
            size_billionths: int(self.size, SIZE_COLUMN)?,
        };
        let extra = self
            .extra
            .iter()
            .map(|(idx, name)| (name.clone(), cells[*idx].to_string()))
            .collect();

        Ok((raw, extra))
    }
}

/// Load and filter a trade file.
pub fn load_trades<P: AsRef<Path>>(path: P, params: &LoadParams) -> Result<TradeTape, DataIntegrityError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    info!(path = %path.display(), "Loading trades");
    parse_trades(BufReader::new(file), params)
}

/// Parse and filter trades from any buffered reader.
pub fn parse_trades<R: BufRead>(reader: R, params: &LoadParams) -> Result<TradeTape, DataIntegrityError> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break Header::parse(&line)?;
                }
            }
            None => return Err(DataIntegrityError::MissingColumn { column: TIMESTAMP_COLUMN }),
        }
    };

    let mut rows = Vec::new();
    let mut total_rows = 0usize;
    for (idx, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        total_rows += 1;
        let line_no = idx + 1;
        let (raw, extra) = header.parse_row(line_no, &line)?;
        if let Some(trade) = raw.validate(line_no)? {
            rows.push(TradeRow { trade, extra });
        }
    }

    rows.sort_by_key(|row| row.trade.timestamp_ns);

    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        info!(
            first = first.trade.timestamp_ns,
            first_utc = %format_ns(first.trade.timestamp_ns),
            last = last.trade.timestamp_ns,
            last_utc = %format_ns(last.trade.timestamp_ns),
            "Trade data range"
        );
    }

    let rows: Vec<TradeRow> = rows
        .into_iter()
        .filter(|row| row.trade.side == params.side)
        .filter(|row| row.trade.timestamp_ns >= params.start_ns)
        .take(params.row_limit)
        .collect();

    debug!(
        total_rows,
        kept = rows.len(),
        side = %params.side,
        start_ns = params.start_ns,
        row_limit = params.row_limit,
        "Filtered trades"
    );

    if rows.is_empty() {
        return Err(DataIntegrityError::EmptyInput);
    }

    Ok(TradeTape {
        rows,
        extra_columns: header.extra.into_iter().map(|(_, name)| name).collect(),
        total_rows,
    })
}

/// Render a nanosecond timestamp as a UTC datetime
pub fn format_ns(timestamp_ns: i64) -> String {
    let secs = timestamp_ns.div_euclid(1_000_000_000);
    let nanos = timestamp_ns.rem_euclid(1_000_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp_ns.to_string())
}
