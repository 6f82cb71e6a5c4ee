//! Error types for the accumulation pipeline
//!
//! Every error aborts the run. There is no partial result: callers retry
//! with a different configuration (more rows, earlier start date) instead.

use thiserror::Error;

/// Malformed or unexpected input
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    /// A required column is absent from the header row
    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },

    /// A row could not be parsed
    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// A row parsed but violates the trade invariants
    #[error("line {line}: invalid trade: {reason}")]
    InvalidTrade { line: usize, reason: String },

    /// Rounding the two-digit window of the low part carried into a third digit
    #[error("bucketing {timestamp_ns} at exponent {exponent} overflows: window {window} rounds to 100")]
    BucketOverflow {
        timestamp_ns: i64,
        exponent: u32,
        window: i64,
    },

    /// Bucket id does not have as many decimal digits as its timestamp
    #[error("bucket id {bucket_id} has a different digit length than timestamp {timestamp_ns}")]
    DigitLengthMismatch { timestamp_ns: i64, bucket_id: i64 },

    #[error("negative timestamp {timestamp_ns}")]
    NegativeTimestamp { timestamp_ns: i64 },

    /// Downsample exponent outside the supported range
    #[error("downsample exponent {exponent} outside 1..=17")]
    InvalidExponent { exponent: u32 },

    /// Bucket ids went backwards, so the input was not sorted by timestamp
    #[error("bucket {bucket_id} follows bucket {previous}: input is not sorted by timestamp")]
    UnsortedInput { previous: i64, bucket_id: i64 },

    /// A running total or fixed-point conversion left the i64 range
    #[error("arithmetic overflow computing {quantity} at timestamp {timestamp_ns}")]
    ArithmeticOverflow {
        timestamp_ns: i64,
        quantity: &'static str,
    },

    #[error("no trades left after filtering")]
    EmptyInput,

    #[error("failed to read trade data: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a simulation run fails
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// The supplied rows never reach the target notional
    ///
    /// Raise the row limit or move the start date earlier and retry.
    #[error("insufficient data: traded notional {traded_notional} never exceeds target {target_notional}")]
    InsufficientData {
        traded_notional: f64,
        target_notional: f64,
    },

    /// Market VWAP crossed above the strategy VWAP
    #[error(
        "invariant violation at row {row} (timestamp {timestamp_ns}): \
         market vwap {market_vwap} > strategy vwap {cum_vwap}"
    )]
    InvariantViolation {
        row: usize,
        timestamp_ns: i64,
        market_vwap: f64,
        cum_vwap: f64,
    },
}

impl RunError {
    /// Process exit code used by the command-line runner
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::DataIntegrity(_) => 1,
            RunError::InsufficientData { .. } => 2,
            RunError::InvariantViolation { .. } => 3,
        }
    }
}
