//! # Spatial log-density aggregation (`log_density` mode)
//!
//! Load the evaluated tracks, spread their post-warm-up per-timestep
//! log-likelihoods over the anomaly grid, finalize the per-cell statistics and
//! write the three `.npy` maps and the raw JSON sample map.
//!
//! See also
//! ------------
//! * [`TrackAggregator`] – warm-up and binning rules.
//! * [`DensityMapBuilder::finalize`] – per-cell outlier trimming.
//! * [`OutputPaths::log_density_dir`] – artifact locations.
use tracing::info;

use crate::analysis::aggregator::{AggregationSummary, TrackAggregator};
use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::grid::{DensityMapBuilder, DensityMaps};
use crate::paths::OutputPaths;
use crate::tracks::parquet_reader::read_outcomes;
use crate::tracks::track_stats::TrackSetStats;
use crate::tracks::TrackRecord;

/// In-memory result of the aggregation.
#[derive(Debug, Clone)]
pub struct LogDensity {
    pub builder: DensityMapBuilder,
    pub maps: DensityMaps,
    pub summary: AggregationSummary,
}

/// Aggregate and finalize without touching the filesystem.
///
/// With `config.workers > 1` the tracks are aggregated in that many shards; the
/// result is the same as a single pass.
pub fn compute_log_density(
    tracks: &[TrackRecord],
    config: &AnalysisConfig,
) -> Result<LogDensity, AisError> {
    let aggregator = TrackAggregator::new(config);
    let (builder, summary) = if config.workers > 1 {
        aggregator.aggregate_sharded(tracks, config.workers)?
    } else {
        let mut builder = aggregator.builder();
        let summary = aggregator.aggregate(tracks, &mut builder);
        (builder, summary)
    };
    let maps = builder.finalize(config.outlier_quantile);
    Ok(LogDensity {
        builder,
        maps,
        summary,
    })
}

/// Run the `log_density` mode end to end.
///
/// Return
/// ----------
/// * The aggregation counters, [`AisError::InputNotFound`] if the outcomes file is
///   missing, or any read/write error.
pub fn run_log_density(config: &AnalysisConfig) -> Result<AggregationSummary, AisError> {
    let paths = OutputPaths::from_config(config)?;
    let tracks = read_outcomes(&paths.outcomes(), None)?;
    info!(
        tracks = tracks.number_of_tracks(),
        timesteps = tracks.total_timesteps(),
        "outcomes loaded"
    );
    if let Some(stats) = tracks.length_stats() {
        info!("{stats}");
    }

    let LogDensity {
        builder,
        maps,
        summary,
    } = compute_log_density(&tracks, config)?;

    maps.write_npy(&paths)?;
    builder.write_json(&paths.raw_cell_samples())?;

    let (rows, cols) = maps.shape();
    info!(
        %summary,
        populated = maps.populated_cells(),
        cells = rows * cols,
        dir = %paths.log_density_dir(),
        "log density maps written"
    );
    Ok(summary)
}

#[cfg(test)]
mod log_density_test {
    use smallvec::smallvec;

    use super::*;
    use crate::tracks::FourHot;

    #[test]
    fn test_empty_collection() {
        let config = AnalysisConfig::default();
        let result = compute_log_density(&[], &config).unwrap();
        assert_eq!(result.summary, AggregationSummary::default());
        assert_eq!(result.maps.shape(), (30, 30));
        assert_eq!(result.maps.populated_cells(), 0);
        assert!(result.maps.ll_mean().iter().all(|v| v.is_nan()));
        assert!(result.maps.density().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_outlier_in_cell() {
        let config = AnalysisConfig::builder().warmup_timesteps(0).build().unwrap();
        let mut t = TrackRecord::new(0, 1);
        t.positions = vec![FourHot::new(5, 305, 600, 630); 4];
        t.log_weights = vec![
            smallvec![1.0],
            smallvec![1.0],
            smallvec![1.0],
            smallvec![100.0],
        ];
        let result = compute_log_density(&[t], &config).unwrap();
        let cell = result.maps.stats(0, 0).unwrap();
        assert_eq!(cell.count, 3);
        assert_eq!(cell.mean, 1.0);
        assert_eq!(cell.std, 0.0);
        assert_eq!(result.builder.samples((0, 0)).map(<[f64]>::len), Some(4));
    }

    #[test]
    fn test_workers_give_the_same_maps() {
        let tracks: Vec<TrackRecord> = (0..6u32)
            .map(|i| {
                let mut t = TrackRecord::new(i, 1000 + i);
                t.positions = vec![FourHot::new(5 + 10 * i, 305 + 10 * i, 600, 630); 20];
                t.log_weights = (0..20).map(|k| smallvec![-(k as f64) - i as f64]).collect();
                t
            })
            .collect();
        let single = AnalysisConfig::default();
        let sharded = AnalysisConfig::builder().workers(4).build().unwrap();

        let a = compute_log_density(&tracks, &single).unwrap();
        let b = compute_log_density(&tracks, &sharded).unwrap();
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.builder, b.builder);
        assert_eq!(a.maps.populated_cells(), 6);
        assert_eq!(a.maps.density(), b.maps.density());
    }
}
