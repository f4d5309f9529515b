//! Analysis mode selection.
//!
//! The mode is decoded once from its command-line name. `train` and
//! `save_outcomes` are recognized but belong to the model framework, so they
//! fail with [`AisError::UnsupportedMode`].
use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::ais_errors::AisError;
use crate::analysis::abnormal::{run_superposition_stable, run_visualisation};
use crate::analysis::log_density::run_log_density;
use crate::analysis::log_likelihood::run_log_likelihood;
use crate::analysis::reconstruction::run_traj_reconstruction;
use crate::analysis::traj_speed::run_traj_speed;
use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    LogLikelihood,
    LogDensity,
    Visualisation,
    SuperpositionStable,
    TrajSpeed,
    TrajReconstruction,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 6] = [
        AnalysisMode::LogLikelihood,
        AnalysisMode::LogDensity,
        AnalysisMode::Visualisation,
        AnalysisMode::SuperpositionStable,
        AnalysisMode::TrajSpeed,
        AnalysisMode::TrajReconstruction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisMode::LogLikelihood => "ll",
            AnalysisMode::LogDensity => "log_density",
            AnalysisMode::Visualisation => "visualisation",
            AnalysisMode::SuperpositionStable => "superposition_stable",
            AnalysisMode::TrajSpeed => "traj_speed",
            AnalysisMode::TrajReconstruction => "traj_reconstruction",
        }
    }

    /// Execute the mode.
    pub fn run(&self, config: &AnalysisConfig) -> Result<(), AisError> {
        info!(mode = %self, "running analysis");
        match self {
            AnalysisMode::LogLikelihood => run_log_likelihood(config).map(|_| ()),
            AnalysisMode::LogDensity => run_log_density(config).map(|_| ()),
            AnalysisMode::Visualisation => run_visualisation(config).map(|_| ()),
            AnalysisMode::SuperpositionStable => run_superposition_stable(config).map(|_| ()),
            AnalysisMode::TrajSpeed => run_traj_speed(config).map(|_| ()),
            AnalysisMode::TrajReconstruction => run_traj_reconstruction(config).map(|_| ()),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisMode {
    type Err = AisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(mode) = Self::ALL.into_iter().find(|m| m.name() == s) {
            return Ok(mode);
        }
        match s {
            "train" | "save_outcomes" => Err(AisError::UnsupportedMode(s.to_string())),
            _ => Err(AisError::UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod mode_test {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for mode in AnalysisMode::ALL {
            assert_eq!(mode.to_string().parse::<AnalysisMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_framework_modes_are_unsupported() {
        assert_eq!(
            "train".parse::<AnalysisMode>(),
            Err(AisError::UnsupportedMode("train".into()))
        );
        assert_eq!(
            "save_outcomes".parse::<AnalysisMode>(),
            Err(AisError::UnsupportedMode("save_outcomes".into()))
        );
        assert_eq!(
            "plot".parse::<AnalysisMode>(),
            Err(AisError::UnknownMode("plot".into()))
        );
    }
}
