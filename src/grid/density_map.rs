//! # Density / log-likelihood map builder
//!
//! Two-phase construction of the per-cell statistics of the anomaly grid.
//!
//! 1. **Accumulation** – [`DensityMapBuilder::accumulate`] appends one scalar
//!    log-likelihood sample to a cell. Every cell of the grid exists from the start.
//! 2. **Finalization** – [`DensityMapBuilder::finalize`] trims each cell with
//!    [`remove_outliers`] and computes mean, population standard deviation and
//!    retained count. The builder is borrowed, so finalization is repeatable and
//!    gives the same [`DensityMaps`] every time.
//!
//! Partial builders of the same shape can be combined with
//! [`DensityMapBuilder::merge`] before finalization.
//!
//! Persistence
//! -----------------
//! * [`DensityMaps::write_npy`] – `map_density`, `map_ll_mean`, `map_ll_std` as
//!   float64 `.npy` arrays of shape `(LAT_BIN, LON_BIN)`. Empty cells hold `NaN`
//!   mean/std and `0` density.
//! * [`DensityMapBuilder::write_json`] – the raw per-cell samples as a JSON object
//!   keyed by `"row,col"` in row-major order.
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use ndarray::Array2;
use ndarray_npy::write_npy;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::ais_errors::AisError;
use crate::grid::outlier::{mean, population_std, remove_outliers};
use crate::paths::{MapKind, OutputPaths};

/// Statistics of one non-empty grid cell after outlier trimming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStatistics {
    pub mean: f64,
    pub std: f64,
    /// Number of samples kept by the outlier filter.
    pub count: usize,
}

/// Per-cell sample lists, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMapBuilder {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<f64>>,
}

impl DensityMapBuilder {
    /// Grid of `rows x cols` empty cells. Validated configs keep `rows * cols` within
    /// [`MAX_GRID_CELLS`](crate::constants::MAX_GRID_CELLS).
    pub fn new(rows: usize, cols: usize) -> Self {
        DensityMapBuilder {
            rows,
            cols,
            cells: vec![Vec::new(); rows * cols],
        }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    fn offset(&self, (row, col): (usize, usize)) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// Append `sample` to `cell`.
    ///
    /// Return
    /// ----------
    /// * `false` if `cell` is outside the grid; the sample is not stored.
    pub fn accumulate(&mut self, cell: (usize, usize), sample: f64) -> bool {
        match self.offset(cell) {
            Some(i) => {
                self.cells[i].push(sample);
                true
            }
            None => false,
        }
    }

    /// Samples accumulated in `cell`, in insertion order.
    pub fn samples(&self, cell: (usize, usize)) -> Option<&[f64]> {
        self.offset(cell).map(|i| self.cells[i].as_slice())
    }

    /// Total number of samples over the grid.
    pub fn total_samples(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Append every sample of `other` to the matching cell of `self`.
    ///
    /// Return
    /// ----------
    /// * [`AisError::GridShapeMismatch`] if the two builders do not have the same shape.
    pub fn merge(&mut self, other: DensityMapBuilder) -> Result<(), AisError> {
        if other.shape() != self.shape() {
            return Err(AisError::GridShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells) {
            mine.extend(theirs);
        }
        Ok(())
    }

    /// Trim and summarize every cell.
    ///
    /// Arguments
    /// -----------------
    /// * `quantile` – outlier cut in standard deviations (see [`remove_outliers`]).
    ///
    /// Return
    /// ----------
    /// * A [`DensityMaps`] with `None` for every cell that received no sample.
    pub fn finalize(&self, quantile: f64) -> DensityMaps {
        let stats = self
            .cells
            .iter()
            .map(|samples| {
                let kept = remove_outliers(samples, quantile);
                Some(CellStatistics {
                    mean: mean(&kept)?,
                    std: population_std(&kept)?,
                    count: kept.len(),
                })
            })
            .collect();

        DensityMaps {
            rows: self.rows,
            cols: self.cols,
            stats,
        }
    }

    /// Write the raw per-cell samples as JSON, creating the parent directory.
    pub fn write_json(&self, path: &Utf8Path) -> Result<(), AisError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        debug!(path = %path, "raw cell samples written");
        Ok(())
    }
}

impl Serialize for DensityMapBuilder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (i, samples) in self.cells.iter().enumerate() {
            let key = format!("{},{}", i / self.cols, i % self.cols);
            map.serialize_entry(&key, samples)?;
        }
        map.end()
    }
}

/// Finalized statistics of the whole grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMaps {
    rows: usize,
    cols: usize,
    stats: Vec<Option<CellStatistics>>,
}

impl DensityMaps {
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Statistics of one cell, `None` if the cell is empty or outside the grid.
    pub fn stats(&self, row: usize, col: usize) -> Option<CellStatistics> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.stats[row * self.cols + col]
    }

    /// Number of cells holding at least one retained sample.
    pub fn populated_cells(&self) -> usize {
        self.stats.iter().filter(|s| s.is_some()).count()
    }

    fn grid(&self, f: impl Fn(Option<CellStatistics>) -> f64) -> Array2<f64> {
        Array2::from_shape_fn((self.rows, self.cols), |(r, c)| {
            f(self.stats[r * self.cols + c])
        })
    }

    /// Retained sample count per cell, `0` for empty cells.
    pub fn density(&self) -> Array2<f64> {
        self.grid(|s| s.map_or(0.0, |s| s.count as f64))
    }

    /// Mean log-likelihood per cell, `NaN` for empty cells.
    pub fn ll_mean(&self) -> Array2<f64> {
        self.grid(|s| s.map_or(f64::NAN, |s| s.mean))
    }

    /// Log-likelihood standard deviation per cell, `NaN` for empty cells.
    pub fn ll_std(&self) -> Array2<f64> {
        self.grid(|s| s.map_or(f64::NAN, |s| s.std))
    }

    /// Write the three maps as `.npy` files under the log-density directory.
    pub fn write_npy(&self, paths: &OutputPaths) -> Result<(), AisError> {
        fs::create_dir_all(paths.log_density_dir())?;
        for (kind, array) in [
            (MapKind::Density, self.density()),
            (MapKind::LlMean, self.ll_mean()),
            (MapKind::LlStd, self.ll_std()),
        ] {
            let path = paths.density_map(kind);
            write_npy(&path, &array)?;
            debug!(path = %path, "map written");
        }
        Ok(())
    }
}
