//! # ais_anomaly
//!
//! Post-inference analysis of AIS vessel trajectories scored by a recurrent
//! latent-variable model. The inference itself happens elsewhere; this crate reads
//! the persisted outcomes (four-hot positions and per-timestep particle
//! log-weights) and derives:
//!
//! * per-track log-likelihoods and the detection threshold (`ll`),
//! * spatial mean / std / density maps of the log-likelihood (`log_density`),
//! * plot data of the abnormal tracks over the training traffic (`visualisation`,
//!   or `superposition_stable` when tracks are scored once the filter has settled),
//! * speed profiles of the abnormal tracks (`traj_speed`),
//! * reconstruction tables from stored model samples (`traj_reconstruction`).
//!
//! ```rust,no_run
//! use ais_anomaly::config::AnalysisConfig;
//! use ais_anomaly::mode::AnalysisMode;
//!
//! let config = AnalysisConfig::builder()
//!     .trainingset_path("data/ct_brittany/ct_brittany_train.parquet")
//!     .testset_path("data/ct_brittany/ct_brittany_test.parquet")
//!     .build()?;
//! "log_density".parse::<AnalysisMode>()?.run(&config)?;
//! # Ok::<(), ais_anomaly::ais_errors::AisError>(())
//! ```
pub mod ais_errors;
pub mod analysis;
pub mod config;
pub mod constants;
pub mod grid;
pub mod mode;
pub mod paths;
pub mod tracks;

pub mod prelude {
    pub use crate::ais_errors::AisError;
    pub use crate::config::{AnalysisConfig, AnalysisConfigBuilder, Bound, OutOfGridPolicy};
    pub use crate::constants::TrackSet;
    pub use crate::grid::{CellStatistics, DensityMapBuilder, DensityMaps, GridBinner};
    pub use crate::mode::AnalysisMode;
    pub use crate::paths::{MapKind, OutputPaths};
    pub use crate::tracks::parquet_reader::read_outcomes;
    pub use crate::tracks::parquet_writer::write_outcomes;
    pub use crate::tracks::{FourHot, SamplePosition, TrackRecord};
}
