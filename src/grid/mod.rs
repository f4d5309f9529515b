//! # Anomaly grid
//!
//! Spatial aggregation of per-timestep log-likelihoods over a regular
//! latitude/longitude grid covering the region of interest.
//!
//! Modules
//! -----------------
//! * [`outlier`](crate::grid::outlier) – Gaussian outlier trimming and moments.
//! * [`binner`](crate::grid::binner) – one-hot index → `(row, col)` conversion with an out-of-grid policy.
//! * [`density_map`](crate::grid::density_map) – per-cell accumulation, finalization and persistence.
pub mod binner;
pub mod density_map;
pub mod outlier;

pub use binner::{CellHit, GridBinner};
pub use density_map::{CellStatistics, DensityMapBuilder, DensityMaps};
