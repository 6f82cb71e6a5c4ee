//! Timestamp downsampling into bucket ids
//!
//! A timestamp is split into a high part and the last `exponent + 1` digits.
//! The two leading digits of that low part are rounded up to the next multiple
//! of ten, only the resulting leading digit is kept, and it is followed by
//! `exponent` zeros:
//!
//! ```text
//! 1234567890, exponent 6
//!   hi = 123, lo = 4567890, window = 45 -> 50 -> digit 5
//!   bucket = 123 | 5 | 000000 = 1235000000
//! ```
//!
//! This is coarser than plain truncation: trades a few microseconds apart
//! usually land in the same bucket.

use crate::core::DataIntegrityError;

/// Smallest supported exponent (the window needs two digits)
pub const MIN_EXPONENT: u32 = 1;

/// Largest supported exponent (`10^(exponent + 1)` must fit in an i64)
pub const MAX_EXPONENT: u32 = 17;

/// Default exponent: 1e6 ns, i.e. millisecond-scale buckets
pub const DEFAULT_EXPONENT: u32 = 6;

/// Map a nanosecond timestamp to its bucket id.
///
/// # Errors
/// - `BucketOverflow` when the two-digit window is 91..=99 and would round to 100
/// - `DigitLengthMismatch` when the id would not keep the timestamp's digit length
/// - `InvalidExponent` / `NegativeTimestamp` for out-of-range arguments
pub fn bucketize(timestamp_ns: i64, exponent: u32) -> Result<i64, DataIntegrityError> {
    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return Err(DataIntegrityError::InvalidExponent { exponent });
    }
    if timestamp_ns < 0 {
        return Err(DataIntegrityError::NegativeTimestamp { timestamp_ns });
    }

    let modulus = 10_i64.pow(exponent + 1);
    let tick = 10_i64.pow(exponent);
    let hi = timestamp_ns / modulus;
    let lo = timestamp_ns % modulus;

    // Two leading digits of the zero-padded low part
    let window = lo / 10_i64.pow(exponent - 1);
    let rounded = (window + 9) / 10 * 10;
    if rounded >= 100 {
        return Err(DataIntegrityError::BucketOverflow {
            timestamp_ns,
            exponent,
            window,
        });
    }

    let bucket_id = hi
        .checked_mul(modulus)
        .and_then(|base| base.checked_add(rounded / 10 * tick))
        .ok_or(DataIntegrityError::BucketOverflow {
            timestamp_ns,
            exponent,
            window,
        })?;

    if digit_len(bucket_id) != digit_len(timestamp_ns) {
        return Err(DataIntegrityError::DigitLengthMismatch {
            timestamp_ns,
            bucket_id,
        });
    }

    Ok(bucket_id)
}

/// Number of decimal digits in a non-negative value (`0` has one)
#[inline]
pub(crate) fn digit_len(value: i64) -> u32 {
    value.checked_ilog10().map_or(1, |log| log + 1)
}
