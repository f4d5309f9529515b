//! # Output path builder
//!
//! Every artifact written by the toolkit lives under
//! `<results_root>/<dataset>/`, where `<dataset>` is the name of the directory holding
//! the training set. File and directory names embed the run descriptors (training /
//! test set basenames, latent size, `missing_data` flag, bound, threshold, grid
//! resolution) so that runs with different settings never overwrite each other.
//!
//! [`OutputPaths`] is the only place where those names are assembled.
//!
//! Naming conventions
//! -----------------
//! * Floats always carry a fractional part: `0.1`, `1.0`, `-17.47`.
//! * Booleans are rendered `True` / `False`.
//! * Basenames keep their extension (`ct_train.parquet`).
use camino::{Utf8Path, Utf8PathBuf};

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;

/// Render a float with at least one decimal (`1.0`, not `1`).
pub fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Render a boolean as `True` / `False`.
pub fn fmt_bool(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

/// Which of the three log-density grids a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Density,
    LlMean,
    LlStd,
}

impl MapKind {
    pub fn stem(&self) -> &'static str {
        match self {
            MapKind::Density => "map_density",
            MapKind::LlMean => "map_ll_mean",
            MapKind::LlStd => "map_ll_std",
        }
    }
}

/// Named fields that shape every artifact path of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    results_root: Utf8PathBuf,
    dataset: String,
    train_name: String,
    test_name: String,
    latent_size: usize,
    missing_data: bool,
    bound: String,
    lat_reso: f64,
    lon_reso: f64,
}

impl OutputPaths {
    /// Resolve the path fields from a validated configuration.
    ///
    /// Return
    /// ----------
    /// * [`AisError::Utf8PathError`] if the training set path has no parent directory
    ///   name, or one of the dataset paths has no file name.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AisError> {
        let dataset = config
            .trainingset_path
            .parent()
            .and_then(Utf8Path::file_name)
            .ok_or_else(|| {
                AisError::Utf8PathError(format!(
                    "no dataset directory in '{}'",
                    config.trainingset_path
                ))
            })?;
        let train_name = config.trainingset_path.file_name().ok_or_else(|| {
            AisError::Utf8PathError(format!("no file name in '{}'", config.trainingset_path))
        })?;
        let test_name = config.testset_path.file_name().ok_or_else(|| {
            AisError::Utf8PathError(format!("no file name in '{}'", config.testset_path))
        })?;

        Ok(OutputPaths {
            results_root: config.results_root.clone(),
            dataset: dataset.to_string(),
            train_name: train_name.to_string(),
            test_name: test_name.to_string(),
            latent_size: config.latent_size,
            missing_data: config.missing_data,
            bound: config.bound.to_string(),
            lat_reso: config.anomaly_lat_reso,
            lon_reso: config.anomaly_lon_reso,
        })
    }

    /// Same fields, with a different `missing_data` flag.
    pub fn with_missing_data(mut self, missing_data: bool) -> Self {
        self.missing_data = missing_data;
        self
    }

    /// `<results_root>/<dataset>/`
    pub fn dataset_dir(&self) -> Utf8PathBuf {
        self.results_root.join(&self.dataset)
    }

    /// `outcomes-<train>-<test>-<latent>-missing_data-<bool>.parquet`
    pub fn outcomes(&self) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "outcomes-{}-{}-{}-missing_data-{}.parquet",
            self.train_name,
            self.test_name,
            self.latent_size,
            fmt_bool(self.missing_data)
        ))
    }

    /// `log_density-<train>-<test>-<latent>-missing_data-<bool>/`
    pub fn log_density_dir(&self) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "log_density-{}-{}-{}-missing_data-{}",
            self.train_name,
            self.test_name,
            self.latent_size,
            fmt_bool(self.missing_data)
        ))
    }

    /// `<log_density_dir>/<kind>-<lat_reso>-<lon_reso>.npy`
    pub fn density_map(&self, kind: MapKind) -> Utf8PathBuf {
        self.log_density_dir().join(format!(
            "{}-{}-{}.npy",
            kind.stem(),
            fmt_float(self.lat_reso),
            fmt_float(self.lon_reso)
        ))
    }

    /// `<log_density_dir>/map_ll-<lat_reso>-<lon_reso>.json`
    pub fn raw_cell_samples(&self) -> Utf8PathBuf {
        self.log_density_dir().join(format!(
            "map_ll-{}-{}.json",
            fmt_float(self.lat_reso),
            fmt_float(self.lon_reso)
        ))
    }

    /// `ll-<bound>-<train>-<test>-latent_size-<n>-ll_thresh<thr>-missing_data-<bool>.csv`
    ///
    /// `ll_thresh` is the threshold computed from the track scores, not the configured one.
    pub fn log_likelihood(&self, ll_thresh: f64) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "ll-{}-{}-{}-latent_size-{}-ll_thresh{}-missing_data-{}.csv",
            self.bound,
            self.train_name,
            self.test_name,
            self.latent_size,
            fmt_float(ll_thresh),
            fmt_bool(self.missing_data)
        ))
    }

    /// `visualisation-<bound>-<train>-<test>-latent_size-<n>-ll_thresh<thr>-missing_data-<bool>.csv`
    pub fn visualisation(&self, ll_thresh: f64) -> Utf8PathBuf {
        self.plot_table("visualisation", ll_thresh)
    }

    /// `superposition_stable-<bound>-<train>-<test>-latent_size-<n>-ll_thresh<thr>-missing_data-<bool>.csv`
    pub fn superposition_stable(&self, ll_thresh: f64) -> Utf8PathBuf {
        self.plot_table("superposition_stable", ll_thresh)
    }

    fn plot_table(&self, mode: &str, ll_thresh: f64) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "{mode}-{}-{}-{}-latent_size-{}-ll_thresh{}-missing_data-{}.csv",
            self.bound,
            self.train_name,
            self.test_name,
            self.latent_size,
            fmt_float(ll_thresh),
            fmt_bool(self.missing_data)
        ))
    }

    /// `traj_speed-<train>-<test>-<latent>-<-ll_thresh>/`
    pub fn traj_speed_dir(&self, ll_thresh: f64) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "traj_speed-{}-{}-{}-{}",
            self.train_name,
            self.test_name,
            self.latent_size,
            fmt_float(-ll_thresh)
        ))
    }

    /// `traj_reconstruction-<train>-<test>--latent_size-<n>/`
    pub fn traj_reconstruction_dir(&self) -> Utf8PathBuf {
        self.dataset_dir().join(format!(
            "traj_reconstruction-{}-{}--latent_size-{}",
            self.train_name, self.test_name, self.latent_size
        ))
    }
}

/// `<index>_<mmsi>_<ll>.csv`, the per-track file name of the detectors.
pub fn track_file_name(index: usize, mmsi: u32, ll: f64) -> String {
    format!("{index}_{mmsi}_{}.csv", fmt_float(ll))
}

/// `<index>_<sample>_<mmsi>_<ll>.csv`, the per-sample reconstruction file name.
pub fn sample_file_name(index: usize, sample: usize, mmsi: u32, ll: f64) -> String {
    format!("{index}_{sample}_{mmsi}_{}.csv", fmt_float(ll))
}

#[cfg(test)]
mod paths_test {
    use super::*;
    use crate::config::Bound;

    fn paths() -> OutputPaths {
        let config = AnalysisConfig::builder()
            .trainingset_path("data/ct_2017010203_10_20/ct_2017010203_10_20_train.parquet")
            .testset_path("data/ct_2017010203_10_20/ct_2017010203_10_20_test.parquet")
            .latent_size(100)
            .bound(Bound::Elbo)
            .build()
            .unwrap();
        OutputPaths::from_config(&config).unwrap()
    }

    #[test]
    fn test_fmt_float() {
        assert_eq!(fmt_float(0.1), "0.1");
        assert_eq!(fmt_float(1.0), "1.0");
        assert_eq!(fmt_float(-17.47), "-17.47");
        assert_eq!(fmt_float(17.47), "17.47");
        assert_eq!(fmt_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_outcomes_path() {
        assert_eq!(
            paths().outcomes().as_str(),
            "results/ct_2017010203_10_20/outcomes-ct_2017010203_10_20_train.parquet-ct_2017010203_10_20_test.parquet-100-missing_data-False.parquet"
        );
    }

    #[test]
    fn test_density_map_paths() {
        let p = paths();
        let dir = "results/ct_2017010203_10_20/log_density-ct_2017010203_10_20_train.parquet-ct_2017010203_10_20_test.parquet-100-missing_data-False";
        assert_eq!(p.log_density_dir().as_str(), dir);
        assert_eq!(
            p.density_map(MapKind::Density).as_str(),
            format!("{dir}/map_density-0.1-0.1.npy")
        );
        assert_eq!(
            p.density_map(MapKind::LlMean).as_str(),
            format!("{dir}/map_ll_mean-0.1-0.1.npy")
        );
        assert_eq!(
            p.density_map(MapKind::LlStd).as_str(),
            format!("{dir}/map_ll_std-0.1-0.1.npy")
        );
        assert_eq!(p.raw_cell_samples().as_str(), format!("{dir}/map_ll-0.1-0.1.json"));
    }

    #[test]
    fn test_missing_data_flag() {
        let p = paths().with_missing_data(true);
        assert!(p.outcomes().as_str().ends_with("-100-missing_data-True.parquet"));
    }

    #[test]
    fn test_detector_paths() {
        let p = paths();
        assert_eq!(
            p.log_likelihood(-17.5).as_str(),
            "results/ct_2017010203_10_20/ll-elbo-ct_2017010203_10_20_train.parquet-ct_2017010203_10_20_test.parquet-latent_size-100-ll_thresh-17.5-missing_data-False.csv"
        );
        assert_eq!(
            p.superposition_stable(-17.47).file_name(),
            Some("superposition_stable-elbo-ct_2017010203_10_20_train.parquet-ct_2017010203_10_20_test.parquet-latent_size-100-ll_thresh-17.47-missing_data-False.csv")
        );
        assert!(p
            .visualisation(-17.47)
            .as_str()
            .contains("/visualisation-elbo-"));
        assert!(p
            .traj_speed_dir(-17.47)
            .as_str()
            .ends_with("_test.parquet-100-17.47"));
        assert!(p
            .traj_reconstruction_dir()
            .as_str()
            .ends_with("_test.parquet--latent_size-100"));
        assert_eq!(track_file_name(3, 227006760, -20.0), "3_227006760_-20.0.csv");
        assert_eq!(sample_file_name(3, 1, 227006760, -2.5), "3_1_227006760_-2.5.csv");
    }
}
