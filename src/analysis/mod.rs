//! # Analysis modes
//!
//! Each submodule implements one post-inference analysis. Every `run_*` entry point
//! takes the [`AnalysisConfig`](crate::config::AnalysisConfig) by reference, reads
//! the outcomes file resolved by [`OutputPaths`](crate::paths::OutputPaths) and
//! writes its artifacts under the dataset results directory.
//!
//! | Mode                  | Entry point                                              |
//! |-----------------------|----------------------------------------------------------|
//! | `ll`                  | [`log_likelihood::run_log_likelihood`]                   |
//! | `log_density`         | [`log_density::run_log_density`]                         |
//! | `visualisation`       | [`abnormal::run_visualisation`]                          |
//! | `superposition_stable`| [`abnormal::run_superposition_stable`]                   |
//! | `traj_speed`          | [`traj_speed::run_traj_speed`]                           |
//! | `traj_reconstruction` | [`reconstruction::run_traj_reconstruction`]              |
//!
//! The in-memory building blocks (`compute_log_density`, `score_tracks`,
//! `detect_abnormal`, …) are public so that the analyses can be driven without
//! the filesystem.
pub mod abnormal;
pub mod aggregator;
pub mod log_density;
pub mod log_likelihood;
pub mod reconstruction;
pub mod traj_speed;
