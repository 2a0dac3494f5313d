//! Command-line parsing for the temperature-map tool.
//!
//! Argument parsing and command dispatch stay separate from the numerical
//! code; handlers live in `app`.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::domain::{TempMapConfig, TemperatureScale};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tempmap", version, about = "Coronal temperature maps from multi-channel EUV images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build (or load) the synthetic emission table and describe it.
    BuildModel(BuildModelArgs),
    /// Fit a temperature map to a set of channel images.
    Fit(FitArgs),
    /// Fit a synthetic scene with known temperatures and report the error.
    Validate(ValidateArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Response table (JSON or CSV).
    #[arg(long, value_name = "FILE")]
    pub responses: PathBuf,

    /// JSON config file; missing fields use defaults.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Directory for the synthetic table cache (overrides config and env).
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// Resolve the run configuration: defaults, file, environment, flags.
    pub fn load_config(&self) -> Result<TempMapConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => TempMapConfig::from_json_file(path)?,
            None => TempMapConfig::default(),
        };
        config.apply_env();
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Args, Clone)]
pub struct BuildModelArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Rebuild even when a cached table exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Channel image as a headerless CSV grid, in response-table order.
    #[arg(long = "channel", value_name = "CSV", required = true)]
    pub channels: Vec<PathBuf>,

    /// Exposure time in seconds for each `--channel`, same order.
    #[arg(long = "exposure", value_name = "SECONDS", required = true)]
    pub exposures: Vec<f64>,

    /// Output directory for the temperature map.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Disk center column in pixels.
    #[arg(long, requires_all = ["center_y", "radius"])]
    pub center_x: Option<f64>,

    /// Disk center row in pixels.
    #[arg(long, requires_all = ["center_x", "radius"])]
    pub center_y: Option<f64>,

    /// Solar radius in pixels.
    #[arg(long, requires_all = ["center_x", "center_y"])]
    pub radius: Option<f64>,

    /// Observation time stamped on the map (`YYYY-MM-DDTHH:MM:SS`).
    #[arg(long, value_name = "DATETIME")]
    pub date_obs: Option<NaiveDateTime>,

    /// Scale of the exported temperatures.
    #[arg(long, value_enum, default_value_t = TemperatureScale::Log)]
    pub scale: TemperatureScale,

    /// Rebuild the synthetic table even when a cached one exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Relative Gaussian noise added to the synthetic intensities.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Seed for the noise generator.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Rows of the synthetic scene (columns follow the temperature axis).
    #[arg(long, default_value_t = 8)]
    pub rows: usize,
}
