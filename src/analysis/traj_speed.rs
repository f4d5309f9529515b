//! Speed profiles of abnormal tracks (`traj_speed` mode).
//!
//! One CSV per abnormal track, `<index>_<mmsi>_<ll>.csv`, with columns
//! `time_h,lon,lat,sog`. `sog` is the speed bin, i.e. the one-hot speed index
//! minus its segment offset.
use std::fs;

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::ais_errors::AisError;
use crate::analysis::abnormal::{decode_positions, detect_abnormal, AbnormalTrack, TrackScoring};
use crate::config::AnalysisConfig;
use crate::constants::Degree;
use crate::paths::{track_file_name, OutputPaths};
use crate::tracks::parquet_reader::read_outcomes;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedPoint {
    pub time_h: f64,
    pub lon: Degree,
    pub lat: Degree,
    pub sog: i64,
}

/// Time, position and speed bin of every timestep of an abnormal track.
pub fn speed_profile(abnormal: &AbnormalTrack<'_>, config: &AnalysisConfig) -> Vec<SpeedPoint> {
    let offset = config.sog_offset() as i64;
    let hours = config.timesteps_per_hour as f64;
    decode_positions(abnormal.track, config)
        .into_iter()
        .zip(&abnormal.track.positions)
        .enumerate()
        .map(|(t, ((lon, lat), pos))| SpeedPoint {
            time_h: t as f64 / hours,
            lon,
            lat,
            sog: pos.sog as i64 - offset,
        })
        .collect()
}

fn write_profile(path: &Utf8Path, profile: &[SpeedPoint]) -> Result<(), AisError> {
    let mut writer = csv::Writer::from_path(path)?;
    for p in profile {
        writer.serialize(p)?;
    }
    writer.flush()?;
    Ok(())
}

/// Run the `traj_speed` mode. Returns the number of files written.
pub fn run_traj_speed(config: &AnalysisConfig) -> Result<usize, AisError> {
    let paths = OutputPaths::from_config(config)?;
    let tracks = read_outcomes(&paths.outcomes(), None)?;
    let abnormal = detect_abnormal(
        &tracks,
        config.min_duration,
        config.ll_thresh,
        TrackScoring::Mean,
    );

    let dir = paths.traj_speed_dir(config.ll_thresh);
    fs::create_dir_all(&dir)?;
    for a in &abnormal {
        let file = dir.join(track_file_name(a.index, a.track.mmsi, a.log_likelihood));
        write_profile(&file, &speed_profile(a, config))?;
    }

    info!(abnormal = abnormal.len(), dir = %dir, "speed profiles written");
    Ok(abnormal.len())
}
