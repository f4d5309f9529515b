//! # Track scoring (`ll` mode)
//!
//! A track's score is the mean of every particle log-weight of every timestep.
//! Over the scored collection, the detection threshold is `mean - 3·std`
//! (population standard deviation).
//!
//! The mode writes one CSV row per scored track: `index,mmsi,log_likelihood`,
//! where `index` is the position of the track in the outcomes file. The file name
//! carries the computed threshold; when no track is scored it carries the configured
//! `ll_thresh` instead.
use std::fs;

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use tracing::info;

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::constants::{LogLikelihood, Mmsi, LL_THRESH_SIGMAS};
use crate::grid::outlier::{mean, population_std};
use crate::paths::OutputPaths;
use crate::tracks::parquet_reader::read_outcomes;
use crate::tracks::TrackRecord;

/// Score of one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackScore {
    pub index: usize,
    pub mmsi: Mmsi,
    pub log_likelihood: LogLikelihood,
}

/// Distribution of the track scores and the derived threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreThreshold {
    pub mean: f64,
    pub std: f64,
    pub threshold: f64,
}

/// Score every track carrying at least one weight, keeping collection order.
pub fn score_tracks(tracks: &[TrackRecord]) -> Vec<TrackScore> {
    tracks
        .iter()
        .enumerate()
        .filter_map(|(index, t)| {
            t.mean_log_likelihood().map(|ll| TrackScore {
                index,
                mmsi: t.mmsi,
                log_likelihood: ll,
            })
        })
        .collect()
}

/// `mean - sigmas · std` over the scores, `None` if there is no score.
pub fn score_threshold(scores: &[TrackScore], sigmas: f64) -> Option<ScoreThreshold> {
    let values: Vec<f64> = scores.iter().map(|s| s.log_likelihood).collect();
    let m = mean(&values)?;
    let s = population_std(&values)?;
    Some(ScoreThreshold {
        mean: m,
        std: s,
        threshold: m - sigmas * s,
    })
}

/// Run the `ll` mode: score the tracks, log the threshold and write the score table.
pub fn run_log_likelihood(config: &AnalysisConfig) -> Result<Option<ScoreThreshold>, AisError> {
    let paths = OutputPaths::from_config(config)?;
    let tracks = read_outcomes(&paths.outcomes(), None)?;
    let scores = score_tracks(&tracks);

    let threshold = score_threshold(&scores, LL_THRESH_SIGMAS);
    let out = paths.log_likelihood(threshold.map_or(config.ll_thresh, |t| t.threshold));
    fs::create_dir_all(paths.dataset_dir())?;
    let mut writer = csv::Writer::from_path(&out)?;
    for score in &scores {
        writer.serialize(score)?;
    }
    writer.flush()?;

    if let MinMaxResult::MinMax(lo, hi) = scores
        .iter()
        .map(|s| s.log_likelihood)
        .minmax_by(f64::total_cmp)
    {
        info!(min = lo, max = hi, "track score range");
    }
    match threshold {
        Some(t) => info!(
            scored = scores.len(),
            unscored = tracks.len() - scores.len(),
            mean = t.mean,
            std = t.std,
            threshold = t.threshold,
            path = %out,
            "track log-likelihoods written"
        ),
        None => info!(path = %out, "no track carries a log-weight"),
    }
    Ok(threshold)
}
