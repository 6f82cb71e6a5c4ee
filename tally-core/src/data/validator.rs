//! Trade row validation
//!
//! Single validation point between parsed cells and [`Trade`] values.

use super::types::RawTrade;
use crate::core::{DataIntegrityError, Side, Trade};

impl RawTrade {
    /// Check the trade invariants.
    ///
    /// Returns `Ok(None)` for side `0` rows, which carry no direction and are
    /// dropped before the pipeline.
    pub fn validate(self, line: usize) -> Result<Option<Trade>, DataIntegrityError> {
        let invalid = |reason: String| DataIntegrityError::InvalidTrade { line, reason };

        if self.timestamp_ns < 0 {
            return Err(invalid(format!("negative timestamp {}", self.timestamp_ns)));
        }
        if self.price_millionths <= 0 {
            return Err(invalid(format!("non-positive price {}", self.price_millionths)));
        }
        if self.size_billionths <= 0 {
            return Err(invalid(format!("non-positive size {}", self.size_billionths)));
        }

        match self.side {
            0 => Ok(None),
            raw => Side::from_sign(raw)
                .map(|side| {
                    Some(Trade::new(
                        self.timestamp_ns,
                        side,
                        self.price_millionths,
                        self.size_billionths,
                    ))
                })
                .ok_or_else(|| invalid(format!("side {} not in {{-1, 0, 1}}", raw))),
        }
    }
}
