//! # Parquet reader for inference outcomes
//!
//! Ingestion of scored test-set tracks from **Apache Parquet** into a
//! [`TrackSet`]. The reader projects only the columns it needs, downcasts every
//! column once per record batch, and groups rows into [`TrackRecord`]s by `track_id`.
//!
//! ## Expected Parquet Schema
//! -----------------
//! Required columns:
//! - `track_id: UInt32` – grouping key, one value per track.
//! - `mmsi: UInt32` – vessel identifier.
//! - `lat`, `lon`, `sog`, `cog: UInt32` – four-hot indices of the timestep.
//! - `log_weights: List<Float64>` – particle log-weights of the timestep.
//!
//! Optional columns (written by missing-data inference runs):
//! - `sample_lat`, `sample_lon: List<UInt32>` – one entry per model sample.
//!
//! Columns are looked up **by name**, so their order in the file does not matter.
//!
//! ## Null Handling Policy
//! -----------------
//! - Rows with a null scalar column are **skipped**.
//! - A null `log_weights` list is read as a timestep without particles.
//! - Null elements inside a list are dropped.
//!
//! ## Grouping
//! -----------------
//! Tracks are returned in order of first appearance. Rows of a `track_id` seen again
//! later in the file are appended to the existing record.
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;

use ahash::RandomState;
use arrow_array::array::{Array, Float64Array, ListArray, UInt32Array};
use arrow_array::RecordBatch;
use camino::Utf8Path;
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ProjectionMask};
use smallvec::SmallVec;
use tracing::debug;

use crate::ais_errors::AisError;
use crate::constants::{TrackId, TrackSet};
use crate::tracks::{FourHot, ParticleWeights, SamplePosition, TrackRecord};

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

const REQUIRED_COLUMNS: [&str; 7] = ["track_id", "mmsi", "lat", "lon", "sog", "cog", "log_weights"];
const SAMPLE_COLUMNS: [&str; 2] = ["sample_lat", "sample_lon"];

/// Open a Parquet file and build a reader restricted to the named root columns.
///
/// Arguments
/// -----------------
/// * `path` – Parquet file.
/// * `required` – columns that must exist.
/// * `optional` – columns projected only when present.
/// * `batch_size` – Arrow reader batch size (default: 8192 rows).
///
/// Return
/// ----------
/// * The batch reader and the list of optional columns found,
///   [`AisError::InputNotFound`] if the file does not exist,
///   [`AisError::MissingColumn`] if a required column is absent.
pub(crate) fn open_projected(
    path: &Utf8Path,
    required: &[&str],
    optional: &[&str],
    batch_size: Option<usize>,
) -> Result<(parquet::arrow::arrow_reader::ParquetRecordBatchReader, Vec<String>), AisError> {
    if !path.exists() {
        return Err(AisError::InputNotFound(path.to_string()));
    }
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema_descr = builder.parquet_schema();
    let root_names: Vec<&str> = schema_descr
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name())
        .collect();

    let mut roots = Vec::with_capacity(required.len() + optional.len());
    for name in required {
        let idx = root_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| AisError::MissingColumn(name.to_string()))?;
        roots.push(idx);
    }
    let mut found_optional = Vec::new();
    for name in optional {
        if let Some(idx) = root_names.iter().position(|n| n == name) {
            roots.push(idx);
            found_optional.push(name.to_string());
        }
    }

    let mask = ProjectionMask::roots(schema_descr, roots);
    let reader = builder
        .with_projection(mask)
        .with_batch_size(batch_size.unwrap_or(8192))
        .build()?;
    Ok((reader, found_optional))
}

/// Downcast a named column of `batch` to a concrete Arrow array type.
pub(crate) fn typed_column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    expected: &'static str,
) -> Result<&'a T, AisError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AisError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| AisError::InvalidColumnType {
            column: name.to_string(),
            expected,
        })
}

/// Non-null `f64` elements of row `i` of a `List<Float64>` column.
fn f64_list_row(list: &ListArray, values: &Float64Array, i: usize) -> ParticleWeights {
    if list.is_null(i) {
        return SmallVec::new();
    }
    let offsets = list.value_offsets();
    let (start, end) = (offsets[i] as usize, offsets[i + 1] as usize);
    if values.nulls().is_none() {
        SmallVec::from_slice(&values.values()[start..end])
    } else {
        (start..end)
            .filter(|&j| values.is_valid(j))
            .map(|j| values.value(j))
            .collect()
    }
}

/// Non-null `u32` elements of row `i` of a `List<UInt32>` column.
fn u32_list_row(list: &ListArray, values: &UInt32Array, i: usize) -> Vec<u32> {
    if list.is_null(i) {
        return Vec::new();
    }
    let offsets = list.value_offsets();
    let (start, end) = (offsets[i] as usize, offsets[i + 1] as usize);
    (start..end)
        .filter(|&j| values.is_valid(j))
        .map(|j| values.value(j))
        .collect()
}

fn list_values<'a, T: Array + 'static>(
    list: &'a ListArray,
    column: &str,
    expected: &'static str,
) -> Result<&'a T, AisError> {
    list.values()
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| AisError::InvalidColumnType {
            column: column.to_string(),
            expected,
        })
}

/// Load scored tracks from an outcomes Parquet file.
///
/// Arguments
/// -----------------
/// * `path` – outcomes file (see the module documentation for the schema).
/// * `batch_size` – optional Arrow reader batch size (default: 8192 rows).
///
/// Return
/// ----------
/// * The tracks in order of first appearance, or an [`AisError`] on missing file,
///   missing/mistyped column, or Parquet decoding failure.
pub fn read_outcomes(path: &Utf8Path, batch_size: Option<usize>) -> Result<TrackSet, AisError> {
    let (reader, optional) = open_projected(path, &REQUIRED_COLUMNS, &SAMPLE_COLUMNS, batch_size)?;
    let with_samples = optional.len() == SAMPLE_COLUMNS.len();

    let mut tracks: TrackSet = Vec::new();
    let mut index: FastHashMap<TrackId, usize> = FastHashMap::default();
    let mut skipped_rows = 0usize;

    for maybe_batch in reader {
        let batch = maybe_batch?;

        // Downcast once per batch
        let tid = typed_column::<UInt32Array>(&batch, "track_id", "UInt32")?;
        let mmsi = typed_column::<UInt32Array>(&batch, "mmsi", "UInt32")?;
        let lat = typed_column::<UInt32Array>(&batch, "lat", "UInt32")?;
        let lon = typed_column::<UInt32Array>(&batch, "lon", "UInt32")?;
        let sog = typed_column::<UInt32Array>(&batch, "sog", "UInt32")?;
        let cog = typed_column::<UInt32Array>(&batch, "cog", "UInt32")?;
        let lw = typed_column::<ListArray>(&batch, "log_weights", "List<Float64>")?;
        let lw_values = list_values::<Float64Array>(lw, "log_weights", "List<Float64>")?;

        let samples = if with_samples {
            let s_lat = typed_column::<ListArray>(&batch, "sample_lat", "List<UInt32>")?;
            let s_lon = typed_column::<ListArray>(&batch, "sample_lon", "List<UInt32>")?;
            Some((
                s_lat,
                list_values::<UInt32Array>(s_lat, "sample_lat", "List<UInt32>")?,
                s_lon,
                list_values::<UInt32Array>(s_lon, "sample_lon", "List<UInt32>")?,
            ))
        } else {
            None
        };

        for i in 0..batch.num_rows() {
            if [tid, mmsi, lat, lon, sog, cog].iter().any(|c| c.is_null(i)) {
                skipped_rows += 1;
                continue;
            }

            let slot = match index.entry(tid.value(i)) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(v) => {
                    tracks.push(TrackRecord::new(tid.value(i), mmsi.value(i)));
                    *v.insert(tracks.len() - 1)
                }
            };
            let record = &mut tracks[slot];

            record.positions.push(FourHot::new(
                lat.value(i),
                lon.value(i),
                sog.value(i),
                cog.value(i),
            ));
            record.log_weights.push(f64_list_row(lw, lw_values, i));

            if let Some((s_lat, s_lat_v, s_lon, s_lon_v)) = samples {
                let lats = u32_list_row(s_lat, s_lat_v, i);
                let lons = u32_list_row(s_lon, s_lon_v, i);
                record.samples.push(
                    lats.into_iter()
                        .zip(lons)
                        .map(|(lat, lon)| SamplePosition { lat, lon })
                        .collect(),
                );
            }
        }
    }

    debug!(
        path = %path,
        tracks = tracks.len(),
        skipped_rows,
        with_samples,
        "outcomes loaded"
    );
    Ok(tracks)
}
