//! Core types for the participation-rate simulator
//!
//! - `Trade`, `QualifiedTrade`, `AccumulatedTrade`: the records each stage emits
//! - `Side`: trade direction
//! - `fixed_point`: millionths/billionths arithmetic
//! - `errors`: the run's error taxonomy

pub mod errors;
pub mod types;

mod fixed_point_proptest;

// Re-export commonly used types
pub use errors::{DataIntegrityError, RunError};
pub use types::{fixed_point, AccumulatedTrade, QualifiedTrade, Side, Trade};
