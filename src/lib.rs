//! Crop yield dashboard core.
//!
//! Pure functions over an immutable, typed dataset: loading, prediction,
//! and region / time-series aggregation. The `crop-yield-dashboard` binary
//! is an egui shell around this library.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod predict;

pub use error::{Result, YieldError};
