//! Shared pipeline steps behind the CLI subcommands.
//!
//! config -> synthetic table (cache or build) -> image stack -> fit -> limb
//! mask -> scale -> export. Handlers in `app` only add presentation.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::data::{ImageStack, NoiseSpec, SyntheticScene, ValidationReport, validate_scene};
use crate::domain::{ChannelMeta, DiskGeometry, Field, TempMapConfig, TemperatureMap, TemperatureScale};
use crate::error::AppError;
use crate::fit::fit_pixels;
use crate::io::{ExportPaths, ModelCache, load_responses, read_field_csv, write_map};
use crate::models::{ModelKey, ModelOrigin, ResponseTable, SynthModel, build_or_load_model};
use crate::post::mask_off_limb;

/// Synthetic table for the configured axis, plus where it came from.
pub fn load_model(
    config: &TempMapConfig,
    responses: &Path,
    force: bool,
) -> Result<(SynthModel, ModelOrigin), AppError> {
    let axis = config.axis()?;
    let key = ModelKey::from_config(config, &axis);
    let cache = ModelCache::new(&config.cache_dir);
    build_or_load_model(
        || load_responses(responses, config).map_err(AppError::from),
        &key,
        &cache,
        force,
    )
}

/// Everything `run_fit` needs besides the configuration.
#[derive(Debug, Clone)]
pub struct FitInputs {
    pub responses: PathBuf,
    pub channels: Vec<PathBuf>,
    pub exposures: Vec<f64>,
    pub disk: Option<DiskGeometry>,
    /// Acquisition time of the reference channel, carried into the map.
    pub date_obs: Option<NaiveDateTime>,
    pub scale: TemperatureScale,
    pub out_dir: PathBuf,
    pub force: bool,
}

/// All computed outputs of a single `tempmap fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub temperature: TemperatureMap,
    pub goodness: Field,
    pub origin: ModelOrigin,
    pub masked: Option<usize>,
    pub export: ExportPaths,
}

/// Read the channel images as given, without normalization.
pub fn read_channels(inputs: &FitInputs, config: &TempMapConfig) -> Result<(Vec<Field>, Vec<ChannelMeta>), AppError> {
    if inputs.channels.len() != config.n_channels {
        return Err(AppError::config(format!(
            "Expected {} channel images, got {}.",
            config.n_channels,
            inputs.channels.len()
        )));
    }
    if inputs.exposures.len() != inputs.channels.len() {
        return Err(AppError::config(format!(
            "Got {} exposure times for {} channel images.",
            inputs.exposures.len(),
            inputs.channels.len()
        )));
    }

    let mut raw = Vec::with_capacity(inputs.channels.len());
    let mut meta = Vec::with_capacity(inputs.channels.len());
    for (path, &exposure) in inputs.channels.iter().zip(inputs.exposures.iter()) {
        raw.push(read_field_csv(path)?);
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        meta.push(ChannelMeta::new(name, exposure));
    }
    if let Some(reference) = meta.get_mut(config.reference_channel) {
        reference.acquired_at = inputs.date_obs;
    }
    Ok((raw, meta))
}

/// Execute the full fit pipeline and write the results.
pub fn run_fit(config: &TempMapConfig, inputs: &FitInputs) -> Result<FitRun, AppError> {
    let (raw, meta) = read_channels(inputs, config)?;
    let (model, origin) = load_model(config, &inputs.responses, inputs.force)?;

    let stack = ImageStack::normalize(raw, meta, config.reference_channel)?;
    let fit = fit_pixels(&stack, &model, model.axis().values())?;
    let mut temperature = fit.temperature;
    let mut goodness = fit.goodness;

    let masked = inputs.disk.map(|disk| {
        let n = mask_off_limb(&mut temperature.data, &disk, config.limb_radius_multiplier);
        mask_off_limb(&mut goodness, &disk, config.limb_radius_multiplier);
        temperature.meta.disk = Some(disk);
        n
    });

    temperature.convert_scale(inputs.scale);
    let export = write_map(&inputs.out_dir, &temperature, &goodness)?;

    Ok(FitRun {
        temperature,
        goodness,
        origin,
        masked,
        export,
    })
}

/// Fit a temperature ramp spanning the whole axis and score it.
pub fn run_validation(
    config: &TempMapConfig,
    responses_path: &Path,
    rows: usize,
    noise: Option<NoiseSpec>,
) -> Result<ValidationReport, AppError> {
    if rows == 0 {
        return Err(AppError::config("Synthetic scene needs at least one row."));
    }
    let responses: ResponseTable = load_responses(responses_path, config)?;
    let axis = config.axis()?;
    let key = ModelKey::from_config(config, &axis);
    let cache = ModelCache::new(&config.cache_dir);
    let (model, _) = build_or_load_model(|| Ok(responses.clone()), &key, &cache, false)?;

    let scene = SyntheticScene::ramp(rows, model.axis().values(), 1.0);
    let (_, report) = validate_scene(&scene, &responses, &model, noise)?;
    Ok(report)
}
