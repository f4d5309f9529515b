//! Persist scored tracks as an outcomes Parquet file.
//!
//! The layout mirrors [`read_outcomes`](crate::tracks::parquet_reader::read_outcomes):
//! one row per timestep, rows of a track contiguous. The `sample_lat` / `sample_lon`
//! columns are written only when at least one track carries samples.
use std::fs::File;
use std::sync::Arc;

use arrow_array::builder::{Float64Builder, ListBuilder, UInt32Builder};
use arrow_array::{ArrayRef, RecordBatch, UInt32Array};
use camino::Utf8Path;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::ais_errors::AisError;
use crate::tracks::TrackRecord;

/// Write `tracks` to `path`, creating parent directories as needed.
///
/// Timesteps beyond `log_weights` (or `samples`) are written with an empty list.
pub fn write_outcomes(path: &Utf8Path, tracks: &[TrackRecord]) -> Result<(), AisError> {
    let with_samples = tracks.iter().any(TrackRecord::has_samples);
    let rows: usize = tracks.iter().map(TrackRecord::len).sum();

    let mut track_id = Vec::with_capacity(rows);
    let mut mmsi = Vec::with_capacity(rows);
    let mut lat = Vec::with_capacity(rows);
    let mut lon = Vec::with_capacity(rows);
    let mut sog = Vec::with_capacity(rows);
    let mut cog = Vec::with_capacity(rows);
    let mut log_weights = ListBuilder::new(Float64Builder::new());
    let mut sample_lat = ListBuilder::new(UInt32Builder::new());
    let mut sample_lon = ListBuilder::new(UInt32Builder::new());

    for track in tracks {
        for (t, pos) in track.positions.iter().enumerate() {
            track_id.push(track.track_id);
            mmsi.push(track.mmsi);
            lat.push(pos.lat);
            lon.push(pos.lon);
            sog.push(pos.sog);
            cog.push(pos.cog);

            if let Some(weights) = track.log_weights.get(t) {
                log_weights.values().append_slice(weights);
            }
            log_weights.append(true);

            if with_samples {
                if let Some(drawn) = track.samples.get(t) {
                    for s in drawn {
                        sample_lat.values().append_value(s.lat);
                        sample_lon.values().append_value(s.lon);
                    }
                }
                sample_lat.append(true);
                sample_lon.append(true);
            }
        }
    }

    let mut columns: Vec<(&str, ArrayRef)> = vec![
        ("track_id", Arc::new(UInt32Array::from(track_id))),
        ("mmsi", Arc::new(UInt32Array::from(mmsi))),
        ("lat", Arc::new(UInt32Array::from(lat))),
        ("lon", Arc::new(UInt32Array::from(lon))),
        ("sog", Arc::new(UInt32Array::from(sog))),
        ("cog", Arc::new(UInt32Array::from(cog))),
        ("log_weights", Arc::new(log_weights.finish())),
    ];
    if with_samples {
        columns.push(("sample_lat", Arc::new(sample_lat.finish())));
        columns.push(("sample_lon", Arc::new(sample_lon.finish())));
    }
    let batch = RecordBatch::try_from_iter(columns)?;

    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(path = %path, tracks = tracks.len(), rows, with_samples, "outcomes written");
    Ok(())
}
