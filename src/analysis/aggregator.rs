//! Feeds the post-warm-up timesteps of every track into a [`DensityMapBuilder`].
//!
//! A collection is either walked in one pass ([`TrackAggregator::aggregate`]) or cut
//! into contiguous shards aggregated in parallel, each into a private builder, then
//! merged in shard order ([`TrackAggregator::aggregate_sharded`]).
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::grid::{CellHit, DensityMapBuilder, GridBinner};
use crate::tracks::progress_bar::{fmt_dur, TrackProgress};
use crate::tracks::TrackRecord;

/// Counters of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregationSummary {
    /// Tracks visited.
    pub tracks: usize,
    /// Tracks no longer than the warm-up, which contribute nothing.
    pub short_tracks: usize,
    /// Samples stored in the builder (clamped ones included).
    pub samples: usize,
    /// Samples binned outside the grid and snapped to an edge cell.
    pub clamped: usize,
    /// Samples binned outside the grid and dropped.
    pub rejected: usize,
    /// Post-warm-up timesteps without any particle weight, or whose mean log-weight
    /// is not finite (`-inf` or NaN).
    pub skipped: usize,
}

impl AggregationSummary {
    /// Add the counters of another pass.
    pub fn absorb(&mut self, other: AggregationSummary) {
        self.tracks += other.tracks;
        self.short_tracks += other.short_tracks;
        self.samples += other.samples;
        self.clamped += other.clamped;
        self.rejected += other.rejected;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for AggregationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tracks={} (short={}), samples={}, clamped={}, rejected={}, skipped={}",
            self.tracks, self.short_tracks, self.samples, self.clamped, self.rejected, self.skipped
        )
    }
}

/// Turns tracks into grid samples: one sample per timestep after the warm-up.
#[derive(Debug, Clone, Copy)]
pub struct TrackAggregator {
    binner: GridBinner,
    warmup: usize,
}

impl TrackAggregator {
    pub fn new(config: &AnalysisConfig) -> Self {
        TrackAggregator {
            binner: GridBinner::new(config),
            warmup: config.warmup_timesteps,
        }
    }

    /// Empty builder with the grid shape of this aggregator.
    pub fn builder(&self) -> DensityMapBuilder {
        let (rows, cols) = self.binner.shape();
        DensityMapBuilder::new(rows, cols)
    }

    /// Accumulate one track.
    ///
    /// The sample of timestep `t` is the mean of its particle log-weights, placed in
    /// the cell of `positions[t]`. Timesteps `0..warmup` are ignored, as are
    /// non-finite samples, which would turn the statistics of their cell into NaN.
    pub fn aggregate_track(
        &self,
        track: &TrackRecord,
        builder: &mut DensityMapBuilder,
        summary: &mut AggregationSummary,
    ) {
        summary.tracks += 1;
        if track.len() <= self.warmup {
            summary.short_tracks += 1;
            return;
        }

        for (t, pos) in track.positions.iter().enumerate().skip(self.warmup) {
            let Some(ll) = track.timestep_log_likelihood(t).filter(|ll| ll.is_finite()) else {
                summary.skipped += 1;
                continue;
            };
            let hit = self.binner.cell(pos.lat, pos.lon);
            match hit {
                CellHit::Inside(..) => {}
                CellHit::Clamped(..) => summary.clamped += 1,
                CellHit::Rejected => {
                    summary.rejected += 1;
                    continue;
                }
            }
            if let Some(cell) = hit.cell() {
                if builder.accumulate(cell, ll) {
                    summary.samples += 1;
                }
            }
        }
    }

    /// Accumulate a whole collection into `builder`.
    ///
    /// Arguments
    /// -----------------
    /// * `tracks` – evaluated tracks, in any order.
    /// * `builder` – grid to fill; must have the shape returned by [`TrackAggregator::builder`].
    ///
    /// Return
    /// ----------
    /// * The counters of the pass. Out-of-grid samples are reported with `warn!`.
    pub fn aggregate(
        &self,
        tracks: &[TrackRecord],
        builder: &mut DensityMapBuilder,
    ) -> AggregationSummary {
        let mut summary = AggregationSummary::default();
        let mut progress = TrackProgress::new(tracks.len(), "log_density");

        for track in tracks {
            self.aggregate_track(track, builder, &mut summary);
            progress.inc();
        }
        let per_track = fmt_dur(progress.avg());
        progress.finish();

        report(&summary);
        debug!(%summary, %per_track, "aggregation done");
        summary
    }

    /// Accumulate a collection split into `shards` contiguous slices.
    ///
    /// Each shard fills its own builder on the rayon pool. Partial builders and
    /// counters are merged in shard order, so every cell lists its samples in
    /// collection order, exactly as [`TrackAggregator::aggregate`] would.
    ///
    /// Arguments
    /// -----------------
    /// * `tracks` – evaluated tracks.
    /// * `shards` – number of slices; `0` is treated as `1`.
    ///
    /// Return
    /// ----------
    /// * The merged builder and counters, or [`AisError::GridShapeMismatch`] if a
    ///   partial builder does not match the grid.
    pub fn aggregate_sharded(
        &self,
        tracks: &[TrackRecord],
        shards: usize,
    ) -> Result<(DensityMapBuilder, AggregationSummary), AisError> {
        let shard_len = tracks.len().div_ceil(shards.max(1)).max(1);
        let partials: Vec<(DensityMapBuilder, AggregationSummary)> = tracks
            .par_chunks(shard_len)
            .map(|shard| {
                let mut builder = self.builder();
                let mut summary = AggregationSummary::default();
                for track in shard {
                    self.aggregate_track(track, &mut builder, &mut summary);
                }
                (builder, summary)
            })
            .collect();

        let mut builder = self.builder();
        let mut summary = AggregationSummary::default();
        for (partial, counters) in partials {
            builder.merge(partial)?;
            summary.absorb(counters);
        }

        report(&summary);
        debug!(%summary, shards, "sharded aggregation done");
        Ok((builder, summary))
    }
}

fn report(summary: &AggregationSummary) {
    if summary.clamped > 0 {
        warn!(clamped = summary.clamped, "samples outside the grid snapped to an edge cell");
    }
    if summary.rejected > 0 {
        warn!(rejected = summary.rejected, "samples outside the grid dropped");
    }
}

#[cfg(test)]
mod aggregator_test {
    use smallvec::smallvec;

    use super::*;
    use crate::config::OutOfGridPolicy;
    use crate::tracks::FourHot;

    fn track(len: usize, lat: u32, lon: u32, ll: f64) -> TrackRecord {
        let mut t = TrackRecord::new(0, 227006760);
        t.positions = vec![FourHot::new(lat, lon, 605, 640); len];
        t.log_weights = vec![smallvec![ll, ll]; len];
        t
    }

    fn aggregator(policy: OutOfGridPolicy) -> TrackAggregator {
        let config = AnalysisConfig::builder()
            .warmup_timesteps(12)
            .out_of_grid(policy)
            .build()
            .unwrap();
        TrackAggregator::new(&config)
    }

    #[test]
    fn test_short_track_contributes_nothing() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let mut builder = agg.builder();
        let summary = agg.aggregate(&[track(10, 15, 315, -1.0)], &mut builder);
        assert_eq!(summary.tracks, 1);
        assert_eq!(summary.short_tracks, 1);
        assert_eq!(summary.samples, 0);
        assert_eq!(builder.total_samples(), 0);
    }

    #[test]
    fn test_warmup_is_skipped() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let mut builder = agg.builder();
        let summary = agg.aggregate(&[track(20, 15, 315, -2.0)], &mut builder);
        assert_eq!(summary.samples, 8);
        assert_eq!(builder.samples((1, 1)).map(<[f64]>::len), Some(8));
    }

    #[test]
    fn test_missing_weights_are_skipped() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let mut builder = agg.builder();
        let mut t = track(16, 15, 315, -2.0);
        t.log_weights.truncate(14);
        t.log_weights[13] = smallvec![];
        let summary = agg.aggregate(&[t], &mut builder);
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.skipped, 3);
    }

    #[test]
    fn test_out_of_grid_policies() {
        let tracks = [track(13, 400, 315, -1.0)];

        let agg = aggregator(OutOfGridPolicy::Clamp);
        let mut builder = agg.builder();
        let summary = agg.aggregate(&tracks, &mut builder);
        assert_eq!((summary.samples, summary.clamped, summary.rejected), (1, 1, 0));
        assert_eq!(builder.samples((29, 1)), Some(&[-1.0][..]));

        let agg = aggregator(OutOfGridPolicy::Reject);
        let mut builder = agg.builder();
        let summary = agg.aggregate(&tracks, &mut builder);
        assert_eq!((summary.samples, summary.clamped, summary.rejected), (0, 0, 1));
        assert_eq!(builder.total_samples(), 0);
    }

    #[test]
    fn test_non_finite_samples_are_skipped() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let mut builder = agg.builder();
        let mut t = track(15, 15, 315, -2.0);
        t.log_weights[12] = smallvec![f64::NEG_INFINITY, -1.0];
        t.log_weights[13] = smallvec![f64::NAN];
        let summary = agg.aggregate(&[t], &mut builder);
        assert_eq!((summary.samples, summary.skipped), (1, 2));

        let maps = builder.finalize(1.64);
        let stats = maps.stats(1, 1).unwrap();
        assert_eq!((stats.mean, stats.count), (-2.0, 1));
    }

    #[test]
    fn test_sharded_matches_single_pass() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let tracks: Vec<TrackRecord> = (0..7)
            .map(|i| track(13 + i, 15 + i as u32, 315, -(i as f64) - 0.5))
            .chain([track(5, 15, 315, -1.0), track(14, 400, 315, -3.0)])
            .collect();

        let mut sequential = agg.builder();
        let expected = agg.aggregate(&tracks, &mut sequential);

        for shards in [0, 1, 3, 4, 20] {
            let (builder, summary) = agg.aggregate_sharded(&tracks, shards).unwrap();
            assert_eq!(summary, expected, "{shards} shards");
            assert_eq!(builder, sequential, "{shards} shards");
        }
        assert_eq!(expected.tracks, 9);
        assert_eq!(expected.short_tracks, 1);
        assert_eq!(expected.clamped, 2);
    }

    #[test]
    fn test_sharded_empty_collection() {
        let agg = aggregator(OutOfGridPolicy::Clamp);
        let (builder, summary) = agg.aggregate_sharded(&[], 4).unwrap();
        assert_eq!(summary, AggregationSummary::default());
        assert_eq!(builder.total_samples(), 0);
    }
}
