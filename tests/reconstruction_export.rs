mod common;

use ais_anomaly::analysis::reconstruction::run_traj_reconstruction;
use ais_anomaly::paths::sample_file_name;
use ais_anomaly::prelude::*;
use camino::Utf8Path;
use common::{config_in, constant_track, csv_rows, sampled_track, utf8_tempdir};

fn reconstruction_run(root: &Utf8Path, num_samples: usize) -> AnalysisConfig {
    let config = AnalysisConfigBuilder::from(config_in(root))
        .num_samples(num_samples)
        .build()
        .unwrap();
    // missing-data outcomes, whatever the configured flag
    let paths = OutputPaths::from_config(&config)
        .unwrap()
        .with_missing_data(true);
    write_outcomes(
        &paths.outcomes(),
        &[
            sampled_track(0, 227006760, 30, -4.0, 3),
            sampled_track(1, 227006761, 10, -4.0, 3),
            constant_track(2, 227006762, 30, 150, 450, -4.0),
        ],
    )
    .unwrap();
    config
}

#[test]
fn test_reconstruction_tables() {
    let (_guard, root) = utf8_tempdir();
    let config = reconstruction_run(&root, 2);
    assert!(!config.missing_data);

    assert_eq!(run_traj_reconstruction(&config).unwrap(), 2);

    let dir = OutputPaths::from_config(&config)
        .unwrap()
        .traj_reconstruction_dir();
    for k in 0..2 {
        let rows = csv_rows(&dir.join(sample_file_name(0, k, 227006760, -4.0)));
        assert_eq!(rows.len(), 30);
        let masked: Vec<usize> = rows
            .iter()
            .filter(|r| &r[5] == "true")
            .map(|r| r[0].parse().unwrap())
            .collect();
        assert_eq!(masked, (12..24).collect::<Vec<_>>());
    }
    assert!(!dir.join(sample_file_name(0, 2, 227006760, -4.0)).exists());
}

#[test]
fn test_reconstruction_stops_at_available_samples() {
    let (_guard, root) = utf8_tempdir();
    let config = reconstruction_run(&root, 16);
    assert_eq!(run_traj_reconstruction(&config).unwrap(), 3);
}

#[test]
fn test_reconstruction_without_missing_data_outcomes() {
    let (_guard, root) = utf8_tempdir();
    let config = config_in(&root);
    let paths = OutputPaths::from_config(&config).unwrap();
    write_outcomes(&paths.outcomes(), &[sampled_track(0, 1, 30, -1.0, 1)]).unwrap();

    let err = run_traj_reconstruction(&config).unwrap_err();
    assert!(matches!(err, AisError::InputNotFound(p) if p.ends_with("missing_data-True.parquet")));
}
