//! Property-based tests for fixed-point arithmetic
//!
//! Participation, notional and fee values are all derived with integer
//! arithmetic; these properties pin down their truncation behaviour.
