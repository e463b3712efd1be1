//! Collection of utility functions shared by the Adaptive QoS crates.

#![warn(missing_docs)]

/// Rounding helpers used when presenting derived metrics.
pub mod rounding;

/// Utilities dealing with Unix Timestamps and wall-clock alignment.
pub mod unix_time;
