//! # Constants and type definitions for the AIS analysis toolkit
//!
//! This module centralizes the **default tuning constants**, the **one-hot encoding
//! conventions**, and the **common type definitions** shared by every analysis mode.
//!
//! ## Overview
//!
//! - Defaults for the region of interest and the anomaly grid
//! - Warm-up, outlier and reconstruction window constants
//! - Core type aliases (degrees, one-hot indices, vessel identifiers)
//! - Container types for track collections
//!
//! The four-hot encoding stores each AIS message as four indices into a single
//! concatenated one-hot vector of size `lat_bins + lon_bins + sog_bins + cog_bins`.
//! The longitude index is therefore offset by `lat_bins`, the speed index by
//! `lat_bins + lon_bins`, and so on.

use crate::tracks::TrackRecord;

// -------------------------------------------------------------------------------------------------
// Region of interest and grid defaults
// -------------------------------------------------------------------------------------------------

/// Southern edge of the default region of interest (degrees)
pub const LAT_MIN: Degree = 47.5;

/// Northern edge of the default region of interest (degrees)
pub const LAT_MAX: Degree = 50.5;

/// Western edge of the default region of interest (degrees)
pub const LON_MIN: Degree = -7.0;

/// Eastern edge of the default region of interest (degrees)
pub const LON_MAX: Degree = -4.0;

/// Default latitude size of an anomaly grid cell (degrees)
pub const ANOMALY_LAT_RESO: Degree = 0.1;

/// Default longitude size of an anomaly grid cell (degrees)
pub const ANOMALY_LON_RESO: Degree = 0.1;

/// Angular width of one latitude/longitude one-hot bin (degrees)
pub const ONEHOT_STEP: Degree = 0.01;

/// Upper bound on the number of anomaly grid cells (4096 x 4096)
pub const MAX_GRID_CELLS: usize = 1 << 24;

// -------------------------------------------------------------------------------------------------
// Four-hot encoding defaults
// -------------------------------------------------------------------------------------------------

/// Size of the latitude segment of the one-hot vector
pub const LAT_BINS: u32 = 300;

/// Size of the longitude segment of the one-hot vector
pub const LON_BINS: u32 = 300;

/// Size of the speed-over-ground segment of the one-hot vector
pub const SOG_BINS: u32 = 30;

/// Size of the course-over-ground segment of the one-hot vector
pub const COG_BINS: u32 = 72;

// -------------------------------------------------------------------------------------------------
// Analysis defaults
// -------------------------------------------------------------------------------------------------

/// AIS messages are resampled every ten minutes.
pub const TIMESTEPS_PER_HOUR: u32 = 6;

/// Timesteps skipped at the start of each track before scoring (two hours).
pub const WARMUP_TIMESTEPS: usize = 2 * TIMESTEPS_PER_HOUR as usize;

/// Outlier cut, in standard deviations. Keeps ~90% of a normal distribution.
pub const OUTLIER_QUANTILE: f64 = 1.64;

/// Global log-likelihood threshold below which a track is abnormal
pub const LL_THRESH: f64 = -17.47;

/// Minimum number of timesteps for a track to be considered by the detectors
pub const MIN_DURATION: usize = 4 * TIMESTEPS_PER_HOUR as usize;

/// Number of standard deviations below the mean used for the `ll` threshold
pub const LL_THRESH_SIGMAS: f64 = 3.0;

/// Start of the deleted segment, counted back from the end of the track
pub const RECONSTRUCTION_GAP_START: usize = 18;

/// End (exclusive) of the deleted segment, counted back from the end of the track
pub const RECONSTRUCTION_GAP_END: usize = 6;

/// Default number of model samples exported in reconstruction mode
pub const NUM_SAMPLES: usize = 16;

/// Root directory of every artifact
pub const RESULTS_ROOT: &str = "results";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Index into the concatenated one-hot vector
pub type OneHotIndex = u32;
/// Maritime Mobile Service Identity of a vessel
pub type Mmsi = u32;
/// Identifier of one track in an outcomes file
pub type TrackId = u32;
/// Natural-log likelihood or importance weight
pub type LogLikelihood = f64;

/// All tracks of an outcomes file, in file order.
pub type TrackSet = Vec<TrackRecord>;
