//! # Abnormal track detection (`visualisation` and `superposition_stable` modes)
//!
//! A test track is *abnormal* when it is at least `min_duration` timesteps long
//! and its score is below `ll_thresh`. The score is chosen by [`TrackScoring`]:
//! the mean log-likelihood of the whole track for `visualisation`, the mean
//! log-weight of the first post-warm-up timestep for `superposition_stable`.
//!
//! The visualisation export is the plot data of a map showing every training track
//! as background and the abnormal tracks on top. It is one long-format CSV table,
//! one row per point:
//!
//! ```text
//! set,track,mmsi,point,lon,lat
//! train,0,227006760,0,-4.52,48.33
//! abnormal,17,228051000,0,-5.10,48.02
//! ```
//!
//! `track` is the position of the track in its own collection (training file or
//! outcomes file).
use std::fs;

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::constants::{Degree, LogLikelihood, Mmsi};
use crate::paths::OutputPaths;
use crate::tracks::parquet_reader::read_outcomes;
use crate::tracks::training_reader::read_training_tracks;
use crate::tracks::TrackRecord;

/// How a test track is scored before the threshold applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackScoring {
    /// Mean of every log-weight of the track.
    Mean,
    /// Mean of the log-weights of one timestep. Tracks not reaching it are not scored.
    AtTimestep(usize),
}

impl TrackScoring {
    pub fn score(&self, track: &TrackRecord) -> Option<LogLikelihood> {
        match *self {
            TrackScoring::Mean => track.mean_log_likelihood(),
            TrackScoring::AtTimestep(t) => track.timestep_log_likelihood(t),
        }
    }
}

/// A test track flagged as abnormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbnormalTrack<'a> {
    /// Position of the track in the outcomes collection.
    pub index: usize,
    pub track: &'a TrackRecord,
    /// Score compared with the threshold.
    pub log_likelihood: LogLikelihood,
}

/// Select the abnormal tracks, in collection order.
///
/// Arguments
/// -----------------
/// * `tracks` – evaluated tracks.
/// * `min_duration` – tracks with fewer timesteps are never flagged.
/// * `ll_thresh` – strict upper bound on the score of an abnormal track.
/// * `scoring` – how a track is scored.
pub fn detect_abnormal(
    tracks: &[TrackRecord],
    min_duration: usize,
    ll_thresh: f64,
    scoring: TrackScoring,
) -> Vec<AbnormalTrack<'_>> {
    tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.len() >= min_duration)
        .filter_map(|(index, track)| {
            let ll = scoring.score(track)?;
            (ll < ll_thresh).then_some(AbnormalTrack {
                index,
                track,
                log_likelihood: ll,
            })
        })
        .collect()
}

/// Geographic `(lon, lat)` of every position of a test track.
pub fn decode_positions(track: &TrackRecord, config: &AnalysisConfig) -> Vec<(Degree, Degree)> {
    track
        .positions
        .iter()
        .map(|p| (config.lon_from_index(p.lon), config.lat_from_index(p.lat)))
        .collect()
}

#[derive(Debug, Serialize)]
struct PolylinePoint<'a> {
    set: &'a str,
    track: usize,
    mmsi: Mmsi,
    point: usize,
    lon: Degree,
    lat: Degree,
}

/// Run the `visualisation` mode: tracks scored by their mean log-likelihood.
///
/// Return
/// ----------
/// * The number of abnormal tracks written.
pub fn run_visualisation(config: &AnalysisConfig) -> Result<usize, AisError> {
    let paths = OutputPaths::from_config(config)?;
    let out = paths.visualisation(config.ll_thresh);
    write_plot_table(config, &paths, TrackScoring::Mean, &out)
}

/// Run the `superposition_stable` mode: tracks scored at timestep `warmup_timesteps`,
/// once the filter has settled.
///
/// Return
/// ----------
/// * The number of abnormal tracks written.
pub fn run_superposition_stable(config: &AnalysisConfig) -> Result<usize, AisError> {
    let paths = OutputPaths::from_config(config)?;
    let out = paths.superposition_stable(config.ll_thresh);
    let scoring = TrackScoring::AtTimestep(config.warmup_timesteps);
    write_plot_table(config, &paths, scoring, &out)
}

fn write_plot_table(
    config: &AnalysisConfig,
    paths: &OutputPaths,
    scoring: TrackScoring,
    out: &Utf8Path,
) -> Result<usize, AisError> {
    let tracks = read_outcomes(&paths.outcomes(), None)?;
    let training = read_training_tracks(&config.trainingset_path, None)?;
    let abnormal = detect_abnormal(&tracks, config.min_duration, config.ll_thresh, scoring);

    fs::create_dir_all(paths.dataset_dir())?;
    let mut writer = csv::Writer::from_path(out)?;

    for (i, t) in training.iter().enumerate() {
        for (point, (lon, lat)) in t.to_degrees(config).into_iter().enumerate() {
            writer.serialize(PolylinePoint {
                set: "train",
                track: i,
                mmsi: t.mmsi,
                point,
                lon,
                lat,
            })?;
        }
    }
    for a in &abnormal {
        for (point, (lon, lat)) in decode_positions(a.track, config).into_iter().enumerate() {
            writer.serialize(PolylinePoint {
                set: "abnormal",
                track: a.index,
                mmsi: a.track.mmsi,
                point,
                lon,
                lat,
            })?;
        }
    }
    writer.flush()?;

    info!(
        training = training.len(),
        abnormal = abnormal.len(),
        tested = tracks.len(),
        ?scoring,
        path = %out,
        "abnormal track plot data written"
    );
    Ok(abnormal.len())
}
