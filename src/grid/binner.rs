//! # Grid binner
//!
//! Maps the one-hot latitude/longitude indices of a timestep onto the anomaly grid.
//!
//! The two axes use different conventions and are kept as two named conversions:
//!
//! * latitude:  `row = floor(lat_idx * onehot_step / anomaly_lat_reso)`
//! * longitude: `col = floor((lon_idx - lat_bins) * onehot_step / anomaly_lon_reso)`
//!
//! because the longitude index lives after the latitude segment of the
//! concatenated one-hot vector.
//!
//! Out-of-grid indices
//! -----------------
//! A row outside `[0, LAT_BIN)` (or a column outside `[0, LON_BIN)`) is handled by the
//! configured [`OutOfGridPolicy`]: `Clamp` snaps it to the nearest edge cell,
//! `Reject` returns `None`.
use crate::config::{AnalysisConfig, OutOfGridPolicy, BIN_EPSILON};
use crate::constants::{Degree, OneHotIndex};

/// `floor((raw - origin_offset) * scale / resolution)`.
///
/// Monotone non-decreasing in `raw` for a positive `scale` and `resolution`.
#[inline]
pub fn bin_coordinate(raw: f64, origin_offset: f64, scale: f64, resolution: f64) -> i64 {
    ((raw - origin_offset) * scale / resolution + BIN_EPSILON).floor() as i64
}

/// Where a binned timestep landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellHit {
    /// Inside the grid.
    Inside(usize, usize),
    /// Outside the grid, snapped to the given edge cell.
    Clamped(usize, usize),
    /// Outside the grid and dropped.
    Rejected,
}

impl CellHit {
    /// The cell the sample should be accumulated into, if any.
    pub fn cell(&self) -> Option<(usize, usize)> {
        match *self {
            CellHit::Inside(r, c) | CellHit::Clamped(r, c) => Some((r, c)),
            CellHit::Rejected => None,
        }
    }
}

/// Converts four-hot indices to anomaly grid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBinner {
    lat_reso: Degree,
    lon_reso: Degree,
    onehot_step: Degree,
    lon_offset: f64,
    rows: usize,
    cols: usize,
    policy: OutOfGridPolicy,
}

impl GridBinner {
    pub fn new(config: &AnalysisConfig) -> Self {
        let (rows, cols) = config.grid_shape();
        GridBinner {
            lat_reso: config.anomaly_lat_reso,
            lon_reso: config.anomaly_lon_reso,
            onehot_step: config.onehot_step,
            lon_offset: config.lat_bins as f64,
            rows,
            cols,
            policy: config.out_of_grid,
        }
    }

    /// `(LAT_BIN, LON_BIN)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Unbounded row index of a latitude one-hot index.
    #[inline]
    pub fn lat_to_row(&self, lat_idx: OneHotIndex) -> i64 {
        bin_coordinate(lat_idx as f64, 0.0, self.onehot_step, self.lat_reso)
    }

    /// Unbounded column index of a (lat-offset) longitude one-hot index.
    #[inline]
    pub fn lon_to_col(&self, lon_idx: OneHotIndex) -> i64 {
        bin_coordinate(lon_idx as f64, self.lon_offset, self.onehot_step, self.lon_reso)
    }

    /// Grid cell of a timestep, after applying the out-of-grid policy.
    pub fn cell(&self, lat_idx: OneHotIndex, lon_idx: OneHotIndex) -> CellHit {
        let row = self.lat_to_row(lat_idx);
        let col = self.lon_to_col(lon_idx);

        let inside = |v: i64, n: usize| v >= 0 && (v as usize) < n;
        if inside(row, self.rows) && inside(col, self.cols) {
            return CellHit::Inside(row as usize, col as usize);
        }
        match self.policy {
            OutOfGridPolicy::Reject => CellHit::Rejected,
            OutOfGridPolicy::Clamp => CellHit::Clamped(
                row.clamp(0, self.rows as i64 - 1) as usize,
                col.clamp(0, self.cols as i64 - 1) as usize,
            ),
        }
    }
}

#[cfg(test)]
mod binner_test {
    use super::*;

    fn binner(policy: OutOfGridPolicy) -> GridBinner {
        let config = AnalysisConfig::builder().out_of_grid(policy).build().unwrap();
        GridBinner::new(&config)
    }

    #[test]
    fn test_named_conversions() {
        let b = binner(OutOfGridPolicy::Clamp);
        assert_eq!(b.shape(), (30, 30));
        assert_eq!(b.lat_to_row(0), 0);
        assert_eq!(b.lat_to_row(9), 0);
        assert_eq!(b.lat_to_row(10), 1);
        // decimal edge: 30 * 0.01 / 0.1 must give 3
        assert_eq!(b.lat_to_row(30), 3);
        assert_eq!(b.lat_to_row(299), 29);
        assert_eq!(b.lon_to_col(300), 0);
        assert_eq!(b.lon_to_col(345), 4);
        assert_eq!(b.lon_to_col(599), 29);
        assert_eq!(b.lon_to_col(250), -5);
    }

    #[test]
    fn test_bin_coordinate_monotonic() {
        let mut prev = i64::MIN;
        for i in 0..2_000 {
            let raw = -50.0 + i as f64 * 0.37;
            let idx = bin_coordinate(raw, 3.0, 0.01, 0.1);
            assert!(idx >= prev, "not monotonic at {raw}");
            prev = idx;
        }
    }

    #[test]
    fn test_clamp_policy() {
        let b = binner(OutOfGridPolicy::Clamp);
        assert_eq!(b.cell(15, 315), CellHit::Inside(1, 1));
        assert_eq!(b.cell(300, 315), CellHit::Clamped(29, 1));
        assert_eq!(b.cell(15, 100), CellHit::Clamped(1, 0));
        assert_eq!(b.cell(15, 100).cell(), Some((1, 0)));
    }

    #[test]
    fn test_reject_policy() {
        let b = binner(OutOfGridPolicy::Reject);
        assert_eq!(b.cell(300, 315), CellHit::Rejected);
        assert_eq!(b.cell(300, 315).cell(), None);
        assert_eq!(b.cell(299, 599), CellHit::Inside(29, 29));
    }
}
