//! # Analysis configuration
//!
//! This module defines [`AnalysisConfig`], the single configuration object passed by
//! reference to every analysis stage, together with its validating builder
//! [`AnalysisConfigBuilder`] and a TOML loader.
//!
//! ## Purpose
//!
//! The configuration gathers everything the analysis modes need:
//!
//! - the **region of interest** (`lat_min..lat_max`, `lon_min..lon_max`) and the
//!   **anomaly grid** resolution (`anomaly_lat_reso`, `anomaly_lon_reso`),
//! - the **four-hot encoding** sizes (`lat_bins`, `lon_bins`, `sog_bins`, `cog_bins`)
//!   and the angular width of one one-hot bin (`onehot_step`),
//! - the **scoring knobs** (`warmup_timesteps`, `outlier_quantile`, `ll_thresh`,
//!   `min_duration`, `out_of_grid`),
//! - the **run identification** used to build output paths (`trainingset_path`,
//!   `testset_path`, `latent_size`, `missing_data`, `bound`, `results_root`),
//! - the number of **workers** of the density aggregation.
//!
//! ## Example
//!
//! ```rust
//! use ais_anomaly::config::{AnalysisConfig, OutOfGridPolicy};
//!
//! let config = AnalysisConfig::builder()
//!     .anomaly_lat_reso(0.2)
//!     .anomaly_lon_reso(0.2)
//!     .warmup_timesteps(12)
//!     .out_of_grid(OutOfGridPolicy::Reject)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.grid_shape(), (15, 15));
//! ```
//!
//! ## TOML files
//!
//! Every key is optional; missing keys keep their default value.
//!
//! ```toml
//! trainingset_path = "data/ct_brittany/ct_brittany_train.parquet"
//! testset_path = "data/ct_brittany/ct_brittany_test.parquet"
//! latent_size = 100
//! bound = "elbo"
//!
//! [region]
//! lat_min = 47.5
//! lat_max = 50.5
//!
//! [grid]
//! anomaly_lat_reso = 0.1
//! out_of_grid = "clamp"
//! ```
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::ais_errors::AisError;
use crate::constants::{
    Degree, ANOMALY_LAT_RESO, ANOMALY_LON_RESO, COG_BINS, LAT_BINS, LAT_MAX, LAT_MIN, LL_THRESH,
    LON_BINS, LON_MAX, LON_MIN, MAX_GRID_CELLS, MIN_DURATION, NUM_SAMPLES, ONEHOT_STEP, OUTLIER_QUANTILE,
    RECONSTRUCTION_GAP_END, RECONSTRUCTION_GAP_START, RESULTS_ROOT, SOG_BINS, TIMESTEPS_PER_HOUR,
    WARMUP_TIMESTEPS,
};

/// Absolute slack added before flooring a ratio of decimal quantities, so that
/// `30 * 0.01 / 0.1` lands on `3` instead of `2.9999999999999996`.
pub(crate) const BIN_EPSILON: f64 = 1e-9;

/// Variational bound the model was trained with. Only used to name artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    #[default]
    Elbo,
    Iwae,
    Fivo,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Elbo => write!(f, "elbo"),
            Bound::Iwae => write!(f, "iwae"),
            Bound::Fivo => write!(f, "fivo"),
        }
    }
}

impl FromStr for Bound {
    type Err = AisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "elbo" => Ok(Bound::Elbo),
            "iwae" => Ok(Bound::Iwae),
            "fivo" => Ok(Bound::Fivo),
            other => Err(AisError::UnknownBound(other.to_string())),
        }
    }
}

/// What to do with a timestep whose grid cell falls outside `[0, LAT_BIN) x [0, LON_BIN)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfGridPolicy {
    /// Snap the index to the nearest edge cell.
    #[default]
    Clamp,
    /// Drop the sample.
    Reject,
}

impl FromStr for OutOfGridPolicy {
    type Err = AisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(OutOfGridPolicy::Clamp),
            "reject" => Ok(OutOfGridPolicy::Reject),
            other => Err(AisError::InvalidConfig(format!(
                "unknown out-of-grid policy '{other}' (expected 'clamp' or 'reject')"
            ))),
        }
    }
}

/// Configuration shared by every analysis mode.
///
/// Fields
/// -----------------
/// **Region / grid**
/// * `lat_min`, `lat_max`, `lon_min`, `lon_max` – bounding box of the region of interest (degrees).
/// * `anomaly_lat_reso`, `anomaly_lon_reso` – size of one anomaly grid cell (degrees).
/// * `onehot_step` – angular width of one latitude/longitude one-hot bin (degrees).
///
/// **Four-hot encoding**
/// * `lat_bins`, `lon_bins`, `sog_bins`, `cog_bins` – segment sizes of the concatenated one-hot vector.
///
/// **Scoring**
/// * `warmup_timesteps` – leading timesteps ignored by the density aggregation.
/// * `outlier_quantile` – outlier cut in standard deviations.
/// * `out_of_grid` – policy for timesteps binned outside the grid.
/// * `ll_thresh` – global log-likelihood threshold for abnormal tracks.
/// * `min_duration` – minimum track length (timesteps) for the detectors.
/// * `timesteps_per_hour` – sampling rate of the resampled AIS tracks.
/// * `num_samples`, `gap_start`, `gap_end` – reconstruction export controls.
///
/// **Run identification**
/// * `trainingset_path`, `testset_path` – dataset files; their basenames and the
///   training set directory name shape every output path.
/// * `latent_size`, `missing_data`, `bound` – model run descriptors.
/// * `results_root` – root directory of every artifact.
///
/// **Execution**
/// * `workers` – shards of the density aggregation; `1` walks the tracks in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    // --- Region / grid ---
    pub lat_min: Degree,
    pub lat_max: Degree,
    pub lon_min: Degree,
    pub lon_max: Degree,
    pub anomaly_lat_reso: Degree,
    pub anomaly_lon_reso: Degree,
    pub onehot_step: Degree,

    // --- Four-hot encoding ---
    pub lat_bins: u32,
    pub lon_bins: u32,
    pub sog_bins: u32,
    pub cog_bins: u32,

    // --- Scoring ---
    pub warmup_timesteps: usize,
    pub outlier_quantile: f64,
    pub out_of_grid: OutOfGridPolicy,
    pub ll_thresh: f64,
    pub min_duration: usize,
    pub timesteps_per_hour: u32,
    pub num_samples: usize,
    pub gap_start: usize,
    pub gap_end: usize,

    // --- Run identification ---
    pub trainingset_path: Utf8PathBuf,
    pub testset_path: Utf8PathBuf,
    pub latent_size: usize,
    pub missing_data: bool,
    pub bound: Bound,
    pub results_root: Utf8PathBuf,

    // --- Execution ---
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            lat_min: LAT_MIN,
            lat_max: LAT_MAX,
            lon_min: LON_MIN,
            lon_max: LON_MAX,
            anomaly_lat_reso: ANOMALY_LAT_RESO,
            anomaly_lon_reso: ANOMALY_LON_RESO,
            onehot_step: ONEHOT_STEP,

            lat_bins: LAT_BINS,
            lon_bins: LON_BINS,
            sog_bins: SOG_BINS,
            cog_bins: COG_BINS,

            warmup_timesteps: WARMUP_TIMESTEPS,
            outlier_quantile: OUTLIER_QUANTILE,
            out_of_grid: OutOfGridPolicy::Clamp,
            ll_thresh: LL_THRESH,
            min_duration: MIN_DURATION,
            timesteps_per_hour: TIMESTEPS_PER_HOUR,
            num_samples: NUM_SAMPLES,
            gap_start: RECONSTRUCTION_GAP_START,
            gap_end: RECONSTRUCTION_GAP_END,

            trainingset_path: Utf8PathBuf::from("data/dataset/train.parquet"),
            testset_path: Utf8PathBuf::from("data/dataset/test.parquet"),
            latent_size: 100,
            missing_data: false,
            bound: Bound::Elbo,
            results_root: Utf8PathBuf::from(RESULTS_ROOT),

            workers: 1,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
    }

    /// Latitude extent of the region of interest (degrees).
    #[inline]
    pub fn lat_range(&self) -> Degree {
        self.lat_max - self.lat_min
    }

    /// Longitude extent of the region of interest (degrees).
    #[inline]
    pub fn lon_range(&self) -> Degree {
        self.lon_max - self.lon_min
    }

    /// Number of anomaly grid cells along each axis, `(LAT_BIN, LON_BIN)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        let rows = (self.lat_range() / self.anomaly_lat_reso + BIN_EPSILON).floor() as usize;
        let cols = (self.lon_range() / self.anomaly_lon_reso + BIN_EPSILON).floor() as usize;
        (rows, cols)
    }

    /// Offset of the speed segment in the concatenated one-hot vector.
    #[inline]
    pub fn sog_offset(&self) -> u32 {
        self.lat_bins + self.lon_bins
    }

    /// Decode a latitude one-hot index into degrees.
    #[inline]
    pub fn lat_from_index(&self, lat_idx: u32) -> Degree {
        (lat_idx as f64 / self.lat_bins as f64) * self.lat_range() + self.lat_min
    }

    /// Decode a (lat-offset) longitude one-hot index into degrees.
    #[inline]
    pub fn lon_from_index(&self, lon_idx: u32) -> Degree {
        ((lon_idx as f64 - self.lat_bins as f64) / self.lon_bins as f64) * self.lon_range()
            + self.lon_min
    }

    /// Load a configuration from a TOML file and validate it.
    ///
    /// Arguments
    /// -----------------
    /// * `path` – TOML file; every key is optional.
    ///
    /// Return
    /// ----------
    /// * The validated configuration, [`AisError::InputNotFound`] if the file does not
    ///   exist, or a TOML/validation error.
    pub fn from_toml_path(path: &Utf8Path) -> Result<Self, AisError> {
        if !path.exists() {
            return Err(AisError::InputNotFound(path.to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a configuration held in memory.
    pub fn from_toml_str(raw: &str) -> Result<Self, AisError> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.into_builder().build()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    trainingset_path: Option<Utf8PathBuf>,
    testset_path: Option<Utf8PathBuf>,
    latent_size: Option<usize>,
    missing_data: Option<bool>,
    bound: Option<Bound>,
    results_root: Option<Utf8PathBuf>,
    workers: Option<usize>,
    region: Option<RegionSection>,
    grid: Option<GridSection>,
    encoding: Option<EncodingSection>,
    scoring: Option<ScoringSection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RegionSection {
    lat_min: Option<f64>,
    lat_max: Option<f64>,
    lon_min: Option<f64>,
    lon_max: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GridSection {
    anomaly_lat_reso: Option<f64>,
    anomaly_lon_reso: Option<f64>,
    onehot_step: Option<f64>,
    out_of_grid: Option<OutOfGridPolicy>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EncodingSection {
    lat_bins: Option<u32>,
    lon_bins: Option<u32>,
    sog_bins: Option<u32>,
    cog_bins: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ScoringSection {
    warmup_timesteps: Option<usize>,
    outlier_quantile: Option<f64>,
    ll_thresh: Option<f64>,
    min_duration: Option<usize>,
    timesteps_per_hour: Option<u32>,
    num_samples: Option<usize>,
    gap_start: Option<usize>,
    gap_end: Option<usize>,
}

impl ConfigFile {
    fn into_builder(self) -> AnalysisConfigBuilder {
        let mut b = AnalysisConfigBuilder::new();
        let c = &mut b.config;

        if let Some(v) = self.trainingset_path {
            c.trainingset_path = v;
        }
        if let Some(v) = self.testset_path {
            c.testset_path = v;
        }
        if let Some(v) = self.latent_size {
            c.latent_size = v;
        }
        if let Some(v) = self.missing_data {
            c.missing_data = v;
        }
        if let Some(v) = self.bound {
            c.bound = v;
        }
        if let Some(v) = self.results_root {
            c.results_root = v;
        }
        if let Some(v) = self.workers {
            c.workers = v;
        }

        let region = self.region.unwrap_or_default();
        c.lat_min = region.lat_min.unwrap_or(c.lat_min);
        c.lat_max = region.lat_max.unwrap_or(c.lat_max);
        c.lon_min = region.lon_min.unwrap_or(c.lon_min);
        c.lon_max = region.lon_max.unwrap_or(c.lon_max);

        let grid = self.grid.unwrap_or_default();
        c.anomaly_lat_reso = grid.anomaly_lat_reso.unwrap_or(c.anomaly_lat_reso);
        c.anomaly_lon_reso = grid.anomaly_lon_reso.unwrap_or(c.anomaly_lon_reso);
        c.onehot_step = grid.onehot_step.unwrap_or(c.onehot_step);
        c.out_of_grid = grid.out_of_grid.unwrap_or(c.out_of_grid);

        let encoding = self.encoding.unwrap_or_default();
        c.lat_bins = encoding.lat_bins.unwrap_or(c.lat_bins);
        c.lon_bins = encoding.lon_bins.unwrap_or(c.lon_bins);
        c.sog_bins = encoding.sog_bins.unwrap_or(c.sog_bins);
        c.cog_bins = encoding.cog_bins.unwrap_or(c.cog_bins);

        let scoring = self.scoring.unwrap_or_default();
        c.warmup_timesteps = scoring.warmup_timesteps.unwrap_or(c.warmup_timesteps);
        c.outlier_quantile = scoring.outlier_quantile.unwrap_or(c.outlier_quantile);
        c.ll_thresh = scoring.ll_thresh.unwrap_or(c.ll_thresh);
        c.min_duration = scoring.min_duration.unwrap_or(c.min_duration);
        c.timesteps_per_hour = scoring.timesteps_per_hour.unwrap_or(c.timesteps_per_hour);
        c.num_samples = scoring.num_samples.unwrap_or(c.num_samples);
        c.gap_start = scoring.gap_start.unwrap_or(c.gap_start);
        c.gap_end = scoring.gap_end.unwrap_or(c.gap_end);

        b
    }
}

/// Builder for [`AnalysisConfig`], with validation.
#[derive(Debug, Clone)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl Default for AnalysisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<AnalysisConfig> for AnalysisConfigBuilder {
    fn from(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    // --- Region / grid ---
    pub fn region(mut self, lat_min: Degree, lat_max: Degree, lon_min: Degree, lon_max: Degree) -> Self {
        self.config.lat_min = lat_min;
        self.config.lat_max = lat_max;
        self.config.lon_min = lon_min;
        self.config.lon_max = lon_max;
        self
    }
    pub fn anomaly_lat_reso(mut self, v: Degree) -> Self {
        self.config.anomaly_lat_reso = v;
        self
    }
    pub fn anomaly_lon_reso(mut self, v: Degree) -> Self {
        self.config.anomaly_lon_reso = v;
        self
    }
    pub fn onehot_step(mut self, v: Degree) -> Self {
        self.config.onehot_step = v;
        self
    }

    // --- Four-hot encoding ---
    pub fn lat_bins(mut self, v: u32) -> Self {
        self.config.lat_bins = v;
        self
    }
    pub fn lon_bins(mut self, v: u32) -> Self {
        self.config.lon_bins = v;
        self
    }
    pub fn sog_bins(mut self, v: u32) -> Self {
        self.config.sog_bins = v;
        self
    }
    pub fn cog_bins(mut self, v: u32) -> Self {
        self.config.cog_bins = v;
        self
    }

    // --- Scoring ---
    pub fn warmup_timesteps(mut self, v: usize) -> Self {
        self.config.warmup_timesteps = v;
        self
    }
    pub fn outlier_quantile(mut self, v: f64) -> Self {
        self.config.outlier_quantile = v;
        self
    }
    pub fn out_of_grid(mut self, v: OutOfGridPolicy) -> Self {
        self.config.out_of_grid = v;
        self
    }
    pub fn ll_thresh(mut self, v: f64) -> Self {
        self.config.ll_thresh = v;
        self
    }
    pub fn min_duration(mut self, v: usize) -> Self {
        self.config.min_duration = v;
        self
    }
    pub fn timesteps_per_hour(mut self, v: u32) -> Self {
        self.config.timesteps_per_hour = v;
        self
    }
    pub fn num_samples(mut self, v: usize) -> Self {
        self.config.num_samples = v;
        self
    }
    pub fn reconstruction_gap(mut self, start: usize, end: usize) -> Self {
        self.config.gap_start = start;
        self.config.gap_end = end;
        self
    }

    // --- Run identification ---
    pub fn trainingset_path(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.config.trainingset_path = v.into();
        self
    }
    pub fn testset_path(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.config.testset_path = v.into();
        self
    }
    pub fn latent_size(mut self, v: usize) -> Self {
        self.config.latent_size = v;
        self
    }
    pub fn missing_data(mut self, v: bool) -> Self {
        self.config.missing_data = v;
        self
    }
    pub fn bound(mut self, v: Bound) -> Self {
        self.config.bound = v;
        self
    }
    pub fn results_root(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.config.results_root = v.into();
        self
    }

    // --- Execution ---
    pub fn workers(mut self, v: usize) -> Self {
        self.config.workers = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a < b and comparable (i.e., not NaN).
    #[inline]
    fn lt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Less)
    }

    /// Finalize the builder and produce an [`AnalysisConfig`].
    ///
    /// Validation rules
    /// -----------------
    /// * `lat_min < lat_max`, `lon_min < lon_max`.
    /// * `anomaly_lat_reso > 0`, `anomaly_lon_reso > 0`, `onehot_step > 0`.
    /// * The grid has at least one cell along each axis and at most
    ///   [`MAX_GRID_CELLS`] cells overall.
    /// * `lat_bins`, `lon_bins`, `timesteps_per_hour`, `workers` are non-zero.
    /// * `outlier_quantile >= 0`, `ll_thresh` is finite.
    /// * `gap_start >= gap_end`.
    /// * `trainingset_path` has a parent directory and a file name; `testset_path` has a file name.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(AnalysisConfig)` when every rule holds, `Err(AisError::InvalidConfig)` otherwise.
    pub fn build(self) -> Result<AnalysisConfig, AisError> {
        let c = &self.config;

        if !Self::lt(c.lat_min, c.lat_max) {
            return Err(AisError::InvalidConfig(format!(
                "lat_min ({}) must be lower than lat_max ({})",
                c.lat_min, c.lat_max
            )));
        }
        if !Self::lt(c.lon_min, c.lon_max) {
            return Err(AisError::InvalidConfig(format!(
                "lon_min ({}) must be lower than lon_max ({})",
                c.lon_min, c.lon_max
            )));
        }
        if !Self::gt0(c.anomaly_lat_reso) || !Self::gt0(c.anomaly_lon_reso) {
            return Err(AisError::InvalidConfig(
                "anomaly grid resolutions must be > 0".into(),
            ));
        }
        if !Self::gt0(c.onehot_step) {
            return Err(AisError::InvalidConfig("onehot_step must be > 0".into()));
        }
        let (rows, cols) = c.grid_shape();
        if rows == 0 || cols == 0 {
            return Err(AisError::InvalidConfig(format!(
                "anomaly grid is empty ({rows}x{cols}); resolution larger than the region"
            )));
        }
        if !matches!(rows.checked_mul(cols), Some(n) if n <= MAX_GRID_CELLS) {
            return Err(AisError::InvalidConfig(format!(
                "anomaly grid too large ({rows}x{cols}, at most {MAX_GRID_CELLS} cells)"
            )));
        }
        if c.lat_bins == 0 || c.lon_bins == 0 {
            return Err(AisError::InvalidConfig(
                "lat_bins and lon_bins must be > 0".into(),
            ));
        }
        if c.timesteps_per_hour == 0 {
            return Err(AisError::InvalidConfig(
                "timesteps_per_hour must be > 0".into(),
            ));
        }
        if c.workers == 0 {
            return Err(AisError::InvalidConfig("workers must be > 0".into()));
        }
        if !Self::ge0(c.outlier_quantile) {
            return Err(AisError::InvalidConfig(
                "outlier_quantile must be >= 0".into(),
            ));
        }
        if !c.ll_thresh.is_finite() {
            return Err(AisError::InvalidConfig("ll_thresh must be finite".into()));
        }
        if c.gap_start < c.gap_end {
            return Err(AisError::InvalidConfig(format!(
                "reconstruction gap start ({}) must be >= gap end ({})",
                c.gap_start, c.gap_end
            )));
        }
        if c.trainingset_path.file_name().is_none()
            || c.trainingset_path
                .parent()
                .and_then(|p| p.file_name())
                .is_none()
        {
            return Err(AisError::InvalidConfig(format!(
                "trainingset_path '{}' must be a file inside a dataset directory",
                c.trainingset_path
            )));
        }
        if c.testset_path.file_name().is_none() {
            return Err(AisError::InvalidConfig(format!(
                "testset_path '{}' must name a file",
                c.testset_path
            )));
        }

        Ok(self.config)
    }
}
