//! `ais_anomaly` binary: runs one post-inference analysis mode.
//!
//! ```bash
//! ais_anomaly --mode log_density --config run.toml
//! ais_anomaly --mode ll --trainingset-path data/ct/ct_train.parquet \
//!     --testset-path data/ct/ct_test.parquet --latent-size 100
//! ```
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ais_anomaly::ais_errors::AisError;
use ais_anomaly::config::{AnalysisConfig, AnalysisConfigBuilder, Bound, OutOfGridPolicy};
use ais_anomaly::mode::AnalysisMode;

#[derive(Parser, Debug)]
#[command(
    name = "ais_anomaly",
    version,
    about = "Post-inference analysis of AIS trajectory log-likelihoods",
    long_about = None
)]
struct Args {
    /// Analysis to run: ll, log_density, visualisation, superposition_stable, traj_speed,
    /// traj_reconstruction.
    #[arg(long)]
    mode: String,

    /// TOML configuration file. Defaults are used when absent.
    #[arg(short, long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Override the training set path.
    #[arg(long, value_name = "FILE")]
    trainingset_path: Option<Utf8PathBuf>,

    /// Override the test set path.
    #[arg(long, value_name = "FILE")]
    testset_path: Option<Utf8PathBuf>,

    #[arg(long)]
    latent_size: Option<usize>,

    /// Read outcomes of a missing-data inference run.
    #[arg(long)]
    missing_data: Option<bool>,

    /// elbo, iwae or fivo.
    #[arg(long)]
    bound: Option<Bound>,

    /// Log-likelihood threshold of abnormal tracks.
    #[arg(long, allow_hyphen_values = true)]
    ll_thresh: Option<f64>,

    /// Anomaly grid cell size along latitude (degrees).
    #[arg(long)]
    anomaly_lat_reso: Option<f64>,

    /// Anomaly grid cell size along longitude (degrees).
    #[arg(long)]
    anomaly_lon_reso: Option<f64>,

    /// clamp or reject.
    #[arg(long)]
    out_of_grid: Option<OutOfGridPolicy>,

    #[arg(long, value_name = "DIR")]
    results_root: Option<Utf8PathBuf>,

    /// Shards of the density aggregation.
    #[arg(long)]
    workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_config(args: &Args) -> Result<AnalysisConfig, AisError> {
    let base = match &args.config {
        Some(path) => {
            info!("Loading configuration from {path}");
            AnalysisConfig::from_toml_path(path)?
        }
        None => AnalysisConfig::default(),
    };

    let mut builder = AnalysisConfigBuilder::from(base);
    if let Some(v) = &args.trainingset_path {
        builder = builder.trainingset_path(v.clone());
    }
    if let Some(v) = &args.testset_path {
        builder = builder.testset_path(v.clone());
    }
    if let Some(v) = args.latent_size {
        builder = builder.latent_size(v);
    }
    if let Some(v) = args.missing_data {
        builder = builder.missing_data(v);
    }
    if let Some(v) = args.bound {
        builder = builder.bound(v);
    }
    if let Some(v) = args.ll_thresh {
        builder = builder.ll_thresh(v);
    }
    if let Some(v) = args.anomaly_lat_reso {
        builder = builder.anomaly_lat_reso(v);
    }
    if let Some(v) = args.anomaly_lon_reso {
        builder = builder.anomaly_lon_reso(v);
    }
    if let Some(v) = args.out_of_grid {
        builder = builder.out_of_grid(v);
    }
    if let Some(v) = &args.results_root {
        builder = builder.results_root(v.clone());
    }
    if let Some(v) = args.workers {
        builder = builder.workers(v);
    }
    builder.build()
}

fn run(args: &Args) -> Result<(), AisError> {
    let mode: AnalysisMode = args.mode.parse()?;
    let config = load_config(args)?;
    info!(
        dataset = %config.trainingset_path,
        test = %config.testset_path,
        latent_size = config.latent_size,
        missing_data = config.missing_data,
        bound = %config.bound,
        "configuration ready"
    );
    mode.run(&config)
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
