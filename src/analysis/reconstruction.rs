//! # Trajectory reconstruction (`traj_reconstruction` mode)
//!
//! Compares the true positions of a track with the positions drawn by each model
//! sample of a missing-data inference run. In such runs the segment
//! `[len - gap_start, len - gap_end)` was hidden from the model; the export flags it
//! so that the reconstruction of the gap can be told apart from the filtered part.
//!
//! Outcomes are always read with `missing_data = true`, whatever the configuration says.
//!
//! Output: one CSV per track and sample, `<index>_<k>_<mmsi>_<ll>.csv`, with columns
//! `timestep,true_lat,true_lon,recon_lat,recon_lon,masked`.
use std::fs;
use std::ops::Range;

use camino::Utf8Path;
use itertools::izip;
use serde::Serialize;
use tracing::{debug, info};

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::constants::Degree;
use crate::paths::{sample_file_name, OutputPaths};
use crate::tracks::parquet_reader::read_outcomes;
use crate::tracks::{SamplePosition, TrackRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconstructionPoint {
    pub timestep: usize,
    pub true_lat: Degree,
    pub true_lon: Degree,
    pub recon_lat: Degree,
    pub recon_lon: Degree,
    pub masked: bool,
}

/// Timesteps hidden from the model for a track of `len` timesteps.
pub fn masked_range(len: usize, gap_start: usize, gap_end: usize) -> Range<usize> {
    len.saturating_sub(gap_start)..len.saturating_sub(gap_end)
}

/// Pair the true positions of `track` with one sample path.
pub fn reconstruction_table(
    track: &TrackRecord,
    sample: &[SamplePosition],
    config: &AnalysisConfig,
) -> Vec<ReconstructionPoint> {
    let mask = masked_range(track.len(), config.gap_start, config.gap_end);
    izip!(0.., &track.positions, sample)
        .map(|(t, truth, recon)| ReconstructionPoint {
            timestep: t,
            true_lat: config.lat_from_index(truth.lat),
            true_lon: config.lon_from_index(truth.lon),
            recon_lat: config.lat_from_index(recon.lat),
            recon_lon: config.lon_from_index(recon.lon),
            masked: mask.contains(&t),
        })
        .collect()
}

fn write_table(path: &Utf8Path, table: &[ReconstructionPoint]) -> Result<(), AisError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in table {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Run the `traj_reconstruction` mode. Returns the number of files written.
///
/// Tracks shorter than `min_duration`, without stored samples or without weights
/// are skipped. At most `num_samples` samples are exported per track.
pub fn run_traj_reconstruction(config: &AnalysisConfig) -> Result<usize, AisError> {
    let paths = OutputPaths::from_config(config)?.with_missing_data(true);
    let tracks = read_outcomes(&paths.outcomes(), None)?;

    let dir = paths.traj_reconstruction_dir();
    fs::create_dir_all(&dir)?;

    let mut written = 0;
    let mut skipped = 0;
    for (index, track) in tracks.iter().enumerate() {
        let ll = match track.mean_log_likelihood() {
            Some(ll) if track.len() >= config.min_duration && track.has_samples() => ll,
            _ => {
                skipped += 1;
                continue;
            }
        };
        for k in 0..config.num_samples {
            let Some(sample) = track.sample_path(k) else {
                debug!(track = index, samples = k, "track has fewer samples than requested");
                break;
            };
            let file = dir.join(sample_file_name(index, k, track.mmsi, ll));
            write_table(&file, &reconstruction_table(track, &sample, config))?;
            written += 1;
        }
    }

    info!(written, skipped, dir = %dir, "reconstruction tables written");
    Ok(written)
}

#[cfg(test)]
mod reconstruction_test {
    use smallvec::smallvec;

    use super::*;
    use crate::tracks::FourHot;

    #[test]
    fn test_masked_range() {
        assert_eq!(masked_range(30, 18, 6), 12..24);
        assert_eq!(masked_range(10, 18, 6), 0..4);
        assert!(masked_range(3, 18, 6).is_empty());
    }

    #[test]
    fn test_reconstruction_table() {
        let config = AnalysisConfig::builder()
            .reconstruction_gap(2, 1)
            .build()
            .unwrap();
        let mut t = TrackRecord::new(0, 1);
        t.positions = vec![FourHot::new(150, 450, 600, 630); 4];
        t.log_weights = vec![smallvec![-1.0]; 4];
        let recon = vec![SamplePosition { lat: 0, lon: 300 }; 4];

        let table = reconstruction_table(&t, &recon, &config);
        assert_eq!(table.len(), 4);
        let masked: Vec<bool> = table.iter().map(|p| p.masked).collect();
        assert_eq!(masked, vec![false, false, true, false]);
        assert_eq!(table[0].recon_lat, config.lat_min);
        assert_eq!(table[0].recon_lon, config.lon_min);
        assert!((table[3].true_lat - 49.0).abs() < 1e-12);
        assert_eq!(table[3].timestep, 3);
    }
}
