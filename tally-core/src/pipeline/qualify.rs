//! Bucket qualification
//!
//! Within a bucket of simultaneous trades only the side-appropriate extreme
//! price wins: the highest print for Buy, the lowest for Sell. Every trade at
//! that price qualifies, and a bucket holding a single trade always qualifies.

use super::bucket::bucketize;
use crate::core::{DataIntegrityError, QualifiedTrade, Side, Trade};
use tracing::debug;

/// Flag the winning trades of one bucket.
///
/// Output order equals input order.
pub fn mark(bucket: &[Trade], bucket_id: i64, side: Side) -> Vec<QualifiedTrade> {
    if let [only] = bucket {
        return vec![QualifiedTrade {
            trade: *only,
            bucket_id,
            is_qualified: true,
        }];
    }

    let prices = bucket.iter().map(|t| t.price_millionths);
    let extreme = match side {
        Side::Buy => prices.max(),
        Side::Sell => prices.min(),
    };

    bucket
        .iter()
        .map(|trade| QualifiedTrade {
            trade: *trade,
            bucket_id,
            is_qualified: Some(trade.price_millionths) == extreme,
        })
        .collect()
}

/// Bucketize a time-ordered trade sequence and mark each bucket.
///
/// Consecutive trades with the same bucket id form one bucket. Buckets are
/// emitted in ascending id order; an id lower than its predecessor means the
/// input was not sorted and is rejected.
pub fn qualify(
    trades: &[Trade],
    side: Side,
    exponent: u32,
) -> Result<Vec<QualifiedTrade>, DataIntegrityError> {
    let mut out = Vec::with_capacity(trades.len());
    let mut start = 0;
    let mut current: Option<i64> = None;
    let mut buckets = 0usize;

    for (idx, trade) in trades.iter().enumerate() {
        let bucket_id = bucketize(trade.timestamp_ns, exponent)?;
        match current {
            Some(previous) if bucket_id == previous => continue,
            Some(previous) if bucket_id < previous => {
                return Err(DataIntegrityError::UnsortedInput {
                    previous,
                    bucket_id,
                });
            }
            Some(previous) => {
                out.extend(mark(&trades[start..idx], previous, side));
                buckets += 1;
            }
            None => {}
        }
        current = Some(bucket_id);
        start = idx;
    }

    if let Some(last) = current {
        out.extend(mark(&trades[start..], last, side));
        buckets += 1;
    }

    debug!(
        trades = trades.len(),
        buckets,
        qualified = out.iter().filter(|t| t.is_qualified).count(),
        "Marked qualified trades"
    );

    Ok(out)
}
