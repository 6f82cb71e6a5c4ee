//! Tally Strategies - Accumulation Strategy Runners
//!
//! A strategy owns the choices that stay fixed across runs (the side it
//! trades and how coarsely it buckets time) and composes the core pieces
//! into one call: load the trade file, run the pipeline, memoize the result.
//!
//! ## Available Strategies
//!
//! ### [`AccumulateRunner`] - Participation-Rate Accumulation
//!
//! Captures a fixed fraction of every best-priced trade on its side until
//! the captured notional exceeds a target.
//!
//! ```rust,ignore
//! use tally_core::prelude::*;
//! use tally_strategies::{AccumulateRunner, RunOptions};
//!
//! let runner = AccumulateRunner::new(Side::Buy, 6)?;
//! let rows = runner.run_accumulate_strat("trades.txt", &RunOptions::default())?;
//! ```
//!
//! ## Caching
//!
//! Both the loaded tape and the run result are stored through
//! [`tally_core::cache::ResultCache`] when a cache is attached. Keys include
//! every argument plus the size and modification time of the trade file.

pub mod accumulate;

#[cfg(test)]
mod test_helpers;

pub use accumulate::{AccumulateRunner, RunOptions, StrategyError};
