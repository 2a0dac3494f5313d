//! Build-or-load entry point for the synthetic model.
//!
//! The response table is only needed on a cache miss, so it is passed as a
//! loader closure: a warm cache never touches the response source.

use crate::error::AppError;
use crate::io::cache::ModelCache;
use crate::models::{ModelKey, ModelOrigin, ResponseTable, SynthModel, build_model};

/// Return the cached table for `key`, rebuilding it when absent, unreadable,
/// built for another setup, or when `force_rebuild` is set.
///
/// A rebuilt table is persisted before it is returned. A response loader
/// failure is fatal: there is nothing to fall back to.
pub fn build_or_load_model<F>(
    load_responses: F,
    key: &ModelKey,
    cache: &ModelCache,
    force_rebuild: bool,
) -> Result<(SynthModel, ModelOrigin), AppError>
where
    F: FnOnce() -> Result<ResponseTable, AppError>,
{
    if force_rebuild {
        log::info!("Forced rebuild of synthetic emission table.");
    } else {
        match cache.load(key) {
            Ok(Some(model)) => {
                log::info!(
                    "Loaded synthetic emission table from {}",
                    cache.path_for(key).display()
                );
                return Ok((model, ModelOrigin::Cache));
            }
            Ok(None) => {
                log::info!("No synthetic emission data found. Re-scanning temperature range.");
            }
            Err(e) => {
                log::warn!("Ignoring unusable cached table: {e}");
            }
        }
    }

    let responses = load_responses()?;
    let model = build_model(&responses, key)
        .map_err(|e| AppError::new(4, format!("Failed to build synthetic model: {e}")))?;
    log::debug!(
        "Built {}x{} table over log T {:.2}..{:.2}",
        model.n_temps(),
        model.n_channels(),
        model.axis().t0(),
        model.axis().t_max()
    );

    let path = cache.store(&model)?;
    log::info!("Stored synthetic emission table at {}", path.display());
    Ok((model, ModelOrigin::Built))
}
