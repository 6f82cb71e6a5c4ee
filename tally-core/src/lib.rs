//! Tally Core - Participation-Rate Accumulation Simulator
//!
//! Replays a recorded tape of trade executions and decides, trade by trade,
//! how much a strategy that participates in a fixed share of the
//! best-priced volume would have captured, until a target notional is reached.
//!
//! ## Pipeline
//! 1. `pipeline::bucket` - downsample timestamps into bucket ids
//! 2. `pipeline::qualify` - flag the best-priced trades of each bucket
//! 3. `pipeline::accumulate` - running volume, notional, fees and VWAPs
//! 4. `pipeline::terminate` - trim at the target notional
//!
//! ## Supporting Modules
//! - `core`: record types, fixed-point helpers, error taxonomy
//! - `data`: trade file loading
//! - `config`: run configuration
//! - `cache`: on-disk memoization of results
//! - `report`: run summary and CSV export
//! - `utils`: logging setup
//!
//! All prices are millionths and all sizes billionths; the pipeline does not
//! use floating point except for the reported VWAPs.

pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod utils;

// Re-export core types
pub use crate::core::{
    fixed_point, AccumulatedTrade, DataIntegrityError, QualifiedTrade, RunError, Side, Trade,
};

pub use crate::config::RunConfig;
pub use crate::pipeline::RunParams;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{
        fixed_point, AccumulatedTrade, DataIntegrityError, QualifiedTrade, RunError, Side, Trade,
    };
    pub use crate::config::RunConfig;
    pub use crate::data::{load_trades, LoadParams, TradeTape};
    pub use crate::pipeline::{run, RunParams};
    pub use crate::report::RunSummary;
}
