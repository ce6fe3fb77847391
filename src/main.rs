//! # Disparity tuner
//!
//! Streams a stereo camera pair, shows live block matching disparity and saves the parameters
//! chosen on the sliders when Esc is pressed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cv_disparity_tuner::config::TunerConfig;
use cv_disparity_tuner::session::Session;
use cv_disparity_tuner::store;

#[derive(Parser)]
#[command(about = "Interactive stereo block matching parameter tuner")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Left camera device index
    #[arg(long)]
    left_camera: Option<i32>,

    /// Right camera device index
    #[arg(long)]
    right_camera: Option<i32>,

    /// Rectification maps file
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Output parameter file (.xml, .yml, .yaml or .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Previously saved parameter file used to seed the sliders
    #[arg(short, long)]
    initial_params: Option<PathBuf>,

    /// Directory for snapshots saved with the s key
    #[arg(long)]
    snapshot_dir: Option<PathBuf>
}

impl Cli {
    fn into_config(self) -> Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => TunerConfig::from_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => TunerConfig::default()
        };

        if let Some(i) = self.left_camera {
            config.left_camera = i;
        }
        if let Some(i) = self.right_camera {
            config.right_camera = i;
        }
        if let Some(p) = self.calibration {
            config.calibration = p;
        }
        if let Some(p) = self.output {
            config.output = p;
        }
        if let Some(p) = self.initial_params {
            config.initial_params = Some(p);
        }
        if let Some(p) = self.snapshot_dir {
            config.snapshot_dir = p;
        }

        config.validate()?;

        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = Cli::parse().into_config()?;
    let output = config.output.clone();

    let mut session = Session::new(config).context("failed to start tuning session")?;
    let params = session.run()?;

    // Close the windows before writing
    drop(session);

    info!("Saving depth estimation parameters...");
    store::save(&output, &params)
        .with_context(|| format!("failed to save parameters to {}", output.display()))?;

    Ok(())
}
