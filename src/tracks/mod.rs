//! # Tracks: inference outcomes and training trajectories
//!
//! Types and I/O for the two kinds of trajectories the analysis modes consume.
//!
//! * [`TrackRecord`] – one test-set track as scored by the inference collaborator:
//!   the four-hot encoded positions, the vessel MMSI, the per-timestep particle
//!   log-weights and, for missing-data runs, the model's reconstructed positions.
//! * [`TrainingTrack`](crate::tracks::training_reader::TrainingTrack) – one training-set
//!   track with normalized latitude/longitude, used as background in visualisation exports.
//!
//! Modules
//! -----------------
//! * [`parquet_reader`](crate::tracks::parquet_reader) – Arrow/Parquet ingestion of outcomes
//!   (`track_id`, `mmsi`, `lat`, `lon`, `sog`, `cog`, `log_weights`, optional samples).
//! * [`parquet_writer`](crate::tracks::parquet_writer) – Arrow/Parquet persistence of outcomes.
//! * [`training_reader`](crate::tracks::training_reader) – training set ingestion (`mmsi`, `lat`, `lon`).
//! * [`track_stats`](crate::tracks::track_stats) – set-level counts and length statistics.
//! * *(crate-private)* `progress_bar` – progress UI when the `progress` feature is enabled.
//!
//! Data Model
//! -----------------
//! * One Parquet row per timestep; rows of a track are contiguous and time ordered.
//! * Tracks are returned in order of first appearance of their `track_id`.
//! * Records are immutable once loaded.
use smallvec::SmallVec;

use crate::constants::{LogLikelihood, Mmsi, OneHotIndex, TrackId};

pub mod parquet_reader;
pub mod parquet_writer;
pub mod track_stats;
pub mod training_reader;

pub(crate) mod progress_bar;

/// Log importance weights of every particle at one timestep.
pub type ParticleWeights = SmallVec<[LogLikelihood; 16]>;

/// Four indices into the concatenated one-hot vector `[lat | lon | sog | cog]`.
///
/// `lon` is offset by `lat_bins`, `sog` by `lat_bins + lon_bins`, `cog` by
/// `lat_bins + lon_bins + sog_bins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourHot {
    pub lat: OneHotIndex,
    pub lon: OneHotIndex,
    pub sog: OneHotIndex,
    pub cog: OneHotIndex,
}

impl FourHot {
    pub fn new(lat: OneHotIndex, lon: OneHotIndex, sog: OneHotIndex, cog: OneHotIndex) -> Self {
        FourHot { lat, lon, sog, cog }
    }
}

/// A reconstructed `(lat, lon)` one-hot index pair drawn by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplePosition {
    pub lat: OneHotIndex,
    pub lon: OneHotIndex,
}

/// One evaluated test-set track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackRecord {
    pub track_id: TrackId,
    pub mmsi: Mmsi,
    pub positions: Vec<FourHot>,
    /// `log_weights[t]` holds the particle log-weights of timestep `t`.
    pub log_weights: Vec<ParticleWeights>,
    /// `samples[t][k]` is the position drawn by model sample `k` at timestep `t`.
    /// Empty when the run did not store samples.
    pub samples: Vec<SmallVec<[SamplePosition; 4]>>,
}

impl TrackRecord {
    pub fn new(track_id: TrackId, mmsi: Mmsi) -> Self {
        TrackRecord {
            track_id,
            mmsi,
            ..Default::default()
        }
    }

    /// Number of timesteps of the track.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Per-timestep log-likelihood: mean of the particle log-weights at `timestep`.
    ///
    /// Return
    /// ----------
    /// * `None` if `timestep` has no weights (out of range or zero particles).
    pub fn timestep_log_likelihood(&self, timestep: usize) -> Option<LogLikelihood> {
        let weights = self.log_weights.get(timestep)?;
        if weights.is_empty() {
            return None;
        }
        Some(weights.iter().sum::<f64>() / weights.len() as f64)
    }

    /// Track log-likelihood: mean of every log-weight of every timestep.
    ///
    /// Return
    /// ----------
    /// * `None` if the track carries no weight at all.
    pub fn mean_log_likelihood(&self) -> Option<LogLikelihood> {
        let (sum, count) = self
            .log_weights
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, n), w| (s + w, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Whether the record carries reconstructed positions.
    #[inline]
    pub fn has_samples(&self) -> bool {
        self.samples.iter().any(|s| !s.is_empty())
    }

    /// Positions drawn by model sample `k`, one per timestep.
    ///
    /// Return
    /// ----------
    /// * `None` if any timestep lacks sample `k`.
    pub fn sample_path(&self, k: usize) -> Option<Vec<SamplePosition>> {
        if self.samples.is_empty() {
            return None;
        }
        self.samples.iter().map(|s| s.get(k).copied()).collect()
    }
}
