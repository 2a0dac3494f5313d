//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the run configuration
//! - dispatches to the pipeline
//! - prints reports

use clap::Parser;

use crate::cli::{BuildModelArgs, Cli, Command, FitArgs, ValidateArgs};
use crate::data::NoiseSpec;
use crate::domain::DiskGeometry;
use crate::error::AppError;
use crate::io::ModelCache;
use crate::models::ModelKey;

pub mod pipeline;

/// Entry point for the `tempmap` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::BuildModel(args) => handle_build(args),
        Command::Fit(args) => handle_fit(args),
        Command::Validate(args) => handle_validate(args),
    }
}

fn handle_build(args: BuildModelArgs) -> Result<(), AppError> {
    let config = args.common.load_config()?;
    let (model, origin) = pipeline::load_model(&config, &args.common.responses, args.force)?;

    let axis = config.axis()?;
    let path = ModelCache::new(&config.cache_dir).path_for(&ModelKey::from_config(&config, &axis));
    println!(
        "{}",
        crate::report::format_model_summary(&model, origin, Some(&path))
    );
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = args.common.load_config()?;
    let disk = match (args.center_x, args.center_y, args.radius) {
        (Some(center_x), Some(center_y), Some(radius_px)) => {
            if !(radius_px.is_finite() && radius_px > 0.0) {
                return Err(AppError::config(format!("Disk radius must be > 0 (got {radius_px}).")));
            }
            Some(DiskGeometry {
                center_x,
                center_y,
                radius_px,
            })
        }
        _ => None,
    };

    let inputs = pipeline::FitInputs {
        responses: args.common.responses.clone(),
        channels: args.channels,
        exposures: args.exposures,
        disk,
        date_obs: args.date_obs,
        scale: args.scale,
        out_dir: args.out,
        force: args.force,
    };
    let run = pipeline::run_fit(&config, &inputs)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.temperature, &run.goodness, run.origin, run.masked)
    );
    println!("Wrote {}", run.export.meta.display());
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = args.common.load_config()?;
    if !(args.noise.is_finite() && args.noise >= 0.0) {
        return Err(AppError::config(format!("Noise level must be >= 0 (got {}).", args.noise)));
    }
    let noise = (args.noise > 0.0).then_some(NoiseSpec {
        relative: args.noise,
        seed: args.seed,
    });

    let report = pipeline::run_validation(&config, &args.common.responses, args.rows, noise)?;
    println!("{}", crate::report::format_validation(&report));
    Ok(())
}
