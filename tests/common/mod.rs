#![allow(dead_code)]

use std::fs::File;
use std::sync::Arc;

use ais_anomaly::config::AnalysisConfig;
use ais_anomaly::tracks::{FourHot, SamplePosition, TrackRecord};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, UInt32Array};
use camino::{Utf8Path, Utf8PathBuf};
use parquet::arrow::ArrowWriter;
use smallvec::smallvec;
use tempfile::TempDir;

pub const DATASET: &str = "ct_test";

/// Scratch directory with a UTF-8 path.
pub fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

/// Default configuration rooted in `root`: datasets in `root/data/ct_test/`,
/// artifacts in `root/results/`.
pub fn config_in(root: &Utf8Path) -> AnalysisConfig {
    AnalysisConfig::builder()
        .trainingset_path(root.join("data").join(DATASET).join("ct_test_train.parquet"))
        .testset_path(root.join("data").join(DATASET).join("ct_test_valid.parquet"))
        .results_root(root.join("results"))
        .latent_size(100)
        .build()
        .unwrap()
}

/// A straight track parked on one four-hot position, every particle at `ll`.
pub fn constant_track(id: u32, mmsi: u32, len: usize, lat: u32, lon: u32, ll: f64) -> TrackRecord {
    let mut t = TrackRecord::new(id, mmsi);
    t.positions = vec![FourHot::new(lat, lon, 610, 640); len];
    t.log_weights = vec![smallvec![ll, ll, ll]; len];
    t
}

/// A track moving north one latitude bin per timestep, with `n` identical samples.
pub fn sampled_track(id: u32, mmsi: u32, len: usize, ll: f64, n: usize) -> TrackRecord {
    let mut t = TrackRecord::new(id, mmsi);
    for step in 0..len as u32 {
        t.positions.push(FourHot::new(100 + step, 450, 610, 640));
        t.log_weights.push(smallvec![ll, ll]);
        t.samples
            .push((0..n).map(|_| SamplePosition { lat: 100 + step, lon: 451 }).collect());
    }
    t
}

/// Write a training set: one row per point, `(lon, lat)` normalized to `[0, 1]`.
pub fn write_training(path: &Utf8Path, tracks: &[(u32, Vec<(f64, f64)>)]) {
    let mut mmsi = Vec::new();
    let mut lat = Vec::new();
    let mut lon = Vec::new();
    for (id, points) in tracks {
        for &(x, y) in points {
            mmsi.push(*id);
            lon.push(x);
            lat.push(y);
        }
    }
    let columns: Vec<(&str, ArrayRef)> = vec![
        ("mmsi", Arc::new(UInt32Array::from(mmsi))),
        ("lat", Arc::new(Float64Array::from(lat))),
        ("lon", Arc::new(Float64Array::from(lon))),
    ];
    let batch = RecordBatch::try_from_iter(columns).unwrap();

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Data rows of a CSV file with a header.
pub fn csv_rows(path: &Utf8Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(Result::unwrap).collect()
}
