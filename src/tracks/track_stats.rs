//! # Set-level statistics on track collections
//!
//! Quick metrics reported before each analysis pass: number of tracks, number of
//! timesteps and the distribution of track lengths.
//!
//! Percentiles use the *nearest-rank* method: the index is `round(q × (N-1))` for
//! `q ∈ [0,1]`, clamped to the valid range, which keeps small samples stable.
use std::fmt;

use crate::tracks::TrackRecord;

/// Distribution of track lengths (timesteps per track).
///
/// Display
/// -----------------
/// * `format!("{}", stats)` – single line, e.g. `min=2, p25=4, median=8, p95=15, max=20`.
/// * `format!("{:#}", stats)` – multi-line table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackLengthStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for TrackLengthStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Timesteps per track - summary")?;
            writeln!(f, "-----------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

pub trait TrackSetStats {
    /// Number of tracks in the set.
    fn number_of_tracks(&self) -> usize;

    /// Sum of the lengths of every track.
    fn total_timesteps(&self) -> usize;

    /// Length distribution, `None` for an empty set.
    fn length_stats(&self) -> Option<TrackLengthStats>;
}

impl TrackSetStats for [TrackRecord] {
    #[inline]
    fn number_of_tracks(&self) -> usize {
        self.len()
    }

    #[inline]
    fn total_timesteps(&self) -> usize {
        self.iter().map(TrackRecord::len).sum()
    }

    fn length_stats(&self) -> Option<TrackLengthStats> {
        let mut lengths: Vec<usize> = self.iter().map(TrackRecord::len).collect();
        if lengths.is_empty() {
            return None;
        }
        lengths.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = lengths.len();
        Some(TrackLengthStats {
            min: lengths[0],
            p25: lengths[q_index(n, 0.25)],
            median: lengths[q_index(n, 0.50)],
            p95: lengths[q_index(n, 0.95)],
            max: lengths[n - 1],
        })
    }
}

#[cfg(test)]
mod track_stats_test {
    use super::*;
    use crate::tracks::FourHot;

    fn tracks(lengths: &[usize]) -> Vec<TrackRecord> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let mut t = TrackRecord::new(i as u32, 1);
                t.positions = vec![FourHot::new(0, 0, 0, 0); len];
                t
            })
            .collect()
    }

    #[test]
    fn test_empty_set() {
        let set = tracks(&[]);
        assert_eq!(set.number_of_tracks(), 0);
        assert_eq!(set.total_timesteps(), 0);
        assert_eq!(set.length_stats(), None);
    }

    #[test]
    fn test_length_stats() {
        let set = tracks(&[20, 2, 8, 4, 15]);
        assert_eq!(set.total_timesteps(), 49);
        let stats = set.length_stats().unwrap();
        assert_eq!(
            stats,
            TrackLengthStats {
                min: 2,
                p25: 4,
                median: 8,
                p95: 20,
                max: 20
            }
        );
        assert_eq!(
            stats.to_string(),
            "min=2, p25=4, median=8, p95=20, max=20"
        );
    }
}
