mod common;

use ais_anomaly::analysis::abnormal::run_visualisation;
use ais_anomaly::analysis::log_likelihood::run_log_likelihood;
use ais_anomaly::analysis::traj_speed::run_traj_speed;
use ais_anomaly::paths::{fmt_float, track_file_name};
use ais_anomaly::tracks::ParticleWeights;
use ais_anomaly::prelude::*;
use approx::assert_relative_eq;
use camino::Utf8Path;
use common::{config_in, constant_track, csv_rows, utf8_tempdir, write_training};

fn scored_run(root: &Utf8Path) -> AnalysisConfig {
    let config = AnalysisConfigBuilder::from(config_in(root))
        .ll_thresh(-17.47)
        .min_duration(24)
        .build()
        .unwrap();
    let paths = OutputPaths::from_config(&config).unwrap();
    write_outcomes(
        &paths.outcomes(),
        &[
            constant_track(0, 227006760, 30, 150, 450, -30.0),
            constant_track(1, 227006761, 10, 150, 450, -40.0),
            constant_track(2, 227006762, 30, 150, 450, -2.0),
            constant_track(3, 227006763, 30, 150, 450, -3.0),
        ],
    )
    .unwrap();
    config
}

#[test]
fn test_ll_scores_and_threshold() {
    let (_guard, root) = utf8_tempdir();
    let config = scored_run(&root);
    let paths = OutputPaths::from_config(&config).unwrap();

    let threshold = run_log_likelihood(&config).unwrap().unwrap();

    let scores = [-30.0, -40.0, -2.0, -3.0];
    let mean = scores.iter().sum::<f64>() / 4.0;
    let std = (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / 4.0).sqrt();
    assert_relative_eq!(threshold.mean, mean);
    assert_relative_eq!(threshold.std, std);
    assert_relative_eq!(threshold.threshold, mean - 3.0 * std);

    let out = paths.log_likelihood(threshold.threshold);
    assert!(out.as_str().contains(&format!("-ll_thresh{}-", fmt_float(threshold.threshold))));
    assert!(!paths.log_likelihood(config.ll_thresh).exists());
    let rows = csv_rows(&out);
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[1][0], "1");
    assert_eq!(&rows[1][1], "227006761");
    assert_eq!(rows[1][2].parse::<f64>().unwrap(), -40.0);
}

#[test]
fn test_ll_without_scores_uses_configured_threshold() {
    let (_guard, root) = utf8_tempdir();
    let config = config_in(&root);
    let paths = OutputPaths::from_config(&config).unwrap();
    write_outcomes(&paths.outcomes(), &[]).unwrap();

    assert_eq!(run_log_likelihood(&config).unwrap(), None);
    assert!(csv_rows(&paths.log_likelihood(config.ll_thresh)).is_empty());
}

#[test]
fn test_visualisation_respects_min_duration() {
    let (_guard, root) = utf8_tempdir();
    let config = scored_run(&root);
    let paths = OutputPaths::from_config(&config).unwrap();
    write_training(
        &config.trainingset_path,
        &[
            (111, vec![(0.1, 0.1), (0.2, 0.2), (0.3, 0.3)]),
            (222, vec![(0.9, 0.5), (0.8, 0.5)]),
        ],
    );

    // track 1 scores lower but is too short
    assert_eq!(run_visualisation(&config).unwrap(), 1);

    let rows = csv_rows(&paths.visualisation(config.ll_thresh));
    let train: Vec<_> = rows.iter().filter(|r| &r[0] == "train").collect();
    let abnormal: Vec<_> = rows.iter().filter(|r| &r[0] == "abnormal").collect();
    assert_eq!(train.len(), 5);
    assert_eq!(abnormal.len(), 30);
    assert!(abnormal.iter().all(|r| &r[1] == "0" && &r[2] == "227006760"));
    assert_eq!(&train[3][1], "1");

    let lon: f64 = abnormal[0][4].parse().unwrap();
    let lat: f64 = abnormal[0][5].parse().unwrap();
    assert_relative_eq!(lon, -5.5, epsilon = 1e-12);
    assert_relative_eq!(lat, 49.0, epsilon = 1e-12);
}

#[test]
fn test_superposition_stable_scores_settled_timestep() {
    let (_guard, root) = utf8_tempdir();
    let config = config_in(&root);
    let paths = OutputPaths::from_config(&config).unwrap();
    let mut settled_low = constant_track(0, 227006760, 30, 150, 450, -1.0);
    settled_low.log_weights[config.warmup_timesteps] = ParticleWeights::from_slice(&[-50.0]);
    // low on average, high once settled
    let mut settled_high = constant_track(1, 227006761, 30, 150, 450, -30.0);
    settled_high.log_weights[config.warmup_timesteps] = ParticleWeights::from_slice(&[-2.0]);
    write_outcomes(&paths.outcomes(), &[settled_low, settled_high]).unwrap();
    write_training(&config.trainingset_path, &[(111, vec![(0.1, 0.1)])]);

    let mode: AnalysisMode = "superposition_stable".parse().unwrap();
    mode.run(&config).unwrap();

    let rows = csv_rows(&paths.superposition_stable(config.ll_thresh));
    let abnormal: Vec<_> = rows.iter().filter(|r| &r[0] == "abnormal").collect();
    assert_eq!(abnormal.len(), 30);
    assert!(abnormal.iter().all(|r| &r[1] == "0"));
    assert!(!paths.visualisation(config.ll_thresh).exists());
}

#[test]
fn test_visualisation_needs_training_set() {
    let (_guard, root) = utf8_tempdir();
    let config = scored_run(&root);
    let err = run_visualisation(&config).unwrap_err();
    assert_eq!(
        err,
        AisError::InputNotFound(config.trainingset_path.to_string())
    );
}

#[test]
fn test_traj_speed_files() {
    let (_guard, root) = utf8_tempdir();
    let config = scored_run(&root);
    let paths = OutputPaths::from_config(&config).unwrap();

    assert_eq!(run_traj_speed(&config).unwrap(), 1);

    let file = paths
        .traj_speed_dir(config.ll_thresh)
        .join(track_file_name(0, 227006760, -30.0));
    assert!(file.as_str().ends_with("-17.47/0_227006760_-30.0.csv"));
    let rows = csv_rows(&file);
    assert_eq!(rows.len(), 30);
    assert_eq!(&rows[0][3], "10");
    assert_eq!(rows[6][0].parse::<f64>().unwrap(), 1.0);
}
