//! Training-set ingestion for the visualisation background.
//!
//! The training set is stored as Parquet with one row per AIS message:
//! `mmsi: UInt32`, `lat: Float64`, `lon: Float64`, where `lat`/`lon` are normalized
//! to `[0, 1]` over the region of interest. Consecutive rows sharing an `mmsi`
//! form one track; a new track starts whenever the `mmsi` changes.
use arrow_array::array::{Array, Float64Array, UInt32Array};
use camino::Utf8Path;
use tracing::debug;

use crate::ais_errors::AisError;
use crate::config::AnalysisConfig;
use crate::constants::{Degree, Mmsi};
use crate::tracks::parquet_reader::{open_projected, typed_column};

/// A training track with normalized coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingTrack {
    pub mmsi: Mmsi,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl TrainingTrack {
    /// Geographic `(lon, lat)` points in degrees.
    pub fn to_degrees(&self, config: &AnalysisConfig) -> Vec<(Degree, Degree)> {
        self.lon
            .iter()
            .zip(&self.lat)
            .map(|(lon, lat)| {
                (
                    lon * config.lon_range() + config.lon_min,
                    lat * config.lat_range() + config.lat_min,
                )
            })
            .collect()
    }
}

/// Load the training tracks, in file order. Rows with a null column are skipped.
pub fn read_training_tracks(
    path: &Utf8Path,
    batch_size: Option<usize>,
) -> Result<Vec<TrainingTrack>, AisError> {
    let (reader, _) = open_projected(path, &["mmsi", "lat", "lon"], &[], batch_size)?;

    let mut tracks: Vec<TrainingTrack> = Vec::new();
    for maybe_batch in reader {
        let batch = maybe_batch?;
        let mmsi = typed_column::<UInt32Array>(&batch, "mmsi", "UInt32")?;
        let lat = typed_column::<Float64Array>(&batch, "lat", "Float64")?;
        let lon = typed_column::<Float64Array>(&batch, "lon", "Float64")?;

        for i in 0..batch.num_rows() {
            if mmsi.is_null(i) || lat.is_null(i) || lon.is_null(i) {
                continue;
            }
            let id = mmsi.value(i);
            match tracks.last_mut() {
                Some(t) if t.mmsi == id => {}
                _ => tracks.push(TrainingTrack {
                    mmsi: id,
                    ..Default::default()
                }),
            }
            if let Some(t) = tracks.last_mut() {
                t.lat.push(lat.value(i));
                t.lon.push(lon.value(i));
            }
        }
    }

    debug!(path = %path, tracks = tracks.len(), "training set loaded");
    Ok(tracks)
}
