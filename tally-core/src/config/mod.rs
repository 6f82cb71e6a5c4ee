pub mod constants;
pub mod types;

pub use constants::*;
pub use types::*;

use crate::data::LoadParams;
use crate::pipeline::bucket::{MAX_EXPONENT, MIN_EXPONENT};
use crate::pipeline::RunParams;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use config::{Config as ConfigLoader, Environment, File};
use std::path::Path;

impl RunConfig {
    /// Load configuration: defaults, then the optional TOML file, then
    /// `TALLY__*` environment overrides (e.g. `TALLY__TARGET_NOTIONAL`,
    /// `TALLY__CACHE__DIR`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigLoader::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("TALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let cfg: RunConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&self.downsample_exponent) {
            anyhow::bail!(
                "downsample_exponent {} must be within {}..={}",
                self.downsample_exponent,
                MIN_EXPONENT,
                MAX_EXPONENT
            );
        }

        if !(self.target_participation_rate > 0.0 && self.target_participation_rate <= 1.0) {
            anyhow::bail!(
                "target_participation_rate {} must be in (0, 1]",
                self.target_participation_rate
            );
        }

        if !(self.target_notional.is_finite() && self.target_notional > 0.0) {
            anyhow::bail!("target_notional {} must be positive", self.target_notional);
        }

        if self.fee_rate_bps > MAX_FEE_RATE_BPS {
            anyhow::bail!(
                "fee_rate_bps {} exceeds {}",
                self.fee_rate_bps,
                MAX_FEE_RATE_BPS
            );
        }

        if self.row_limit == 0 {
            anyhow::bail!("row_limit must be positive");
        }

        self.start_ns()?;

        Ok(())
    }

    /// `start_date` as nanoseconds since the epoch
    pub fn start_ns(&self) -> Result<i64> {
        parse_start_date(&self.start_date)
    }

    pub fn run_params(&self) -> RunParams {
        RunParams {
            side: self.side,
            downsample_exponent: self.downsample_exponent,
            target_participation_rate: self.target_participation_rate,
            target_notional: self.target_notional,
            fee_rate_bps: self.fee_rate_bps,
            early_exit: self.early_exit,
        }
    }

    pub fn load_params(&self) -> Result<LoadParams> {
        Ok(LoadParams {
            side: self.side,
            start_ns: self.start_ns()?,
            row_limit: self.row_limit,
        })
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 datetime to epoch nanoseconds
pub fn parse_start_date(text: &str) -> Result<i64> {
    let text = text.trim();
    let datetime = match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => {
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .context("start_date has no midnight")?;
            Utc.from_utc_datetime(&midnight)
        }
        Err(_) => DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("Invalid start_date '{}'", text))?
            .with_timezone(&Utc),
    };

    datetime
        .timestamp_nanos_opt()
        .with_context(|| format!("start_date '{}' is outside the nanosecond range", text))
}
