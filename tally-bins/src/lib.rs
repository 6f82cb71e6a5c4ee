//! Shared code for the tally binaries

pub mod common;
