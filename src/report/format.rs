//! Formatted terminal output.
//!
//! Formatting lives here so the fitting code stays free of presentation
//! details and output changes stay local.

use std::path::Path;

use crate::data::ValidationReport;
use crate::domain::{Field, FieldStats, TemperatureMap};
use crate::math::field_stats;
use crate::models::{ModelOrigin, SynthModel};

fn origin_label(origin: ModelOrigin) -> &'static str {
    match origin {
        ModelOrigin::Cache => "loaded from cache",
        ModelOrigin::Built => "built",
    }
}

fn stats_line(label: &str, s: &FieldStats, unit: &str) -> String {
    if s.n_valid == 0 {
        return format!("{label}: no valid pixels\n");
    }
    format!(
        "{label}: n={}/{} | min={:.4} max={:.4} mean={:.4} std={:.4} {unit}\n",
        s.n_valid, s.n_total, s.min, s.max, s.mean, s.std
    )
}

/// One-paragraph description of a synthetic model.
pub fn format_model_summary(model: &SynthModel, origin: ModelOrigin, path: Option<&Path>) -> String {
    let key = model.key();
    let axis = model.axis();
    let mut out = String::new();
    out.push_str("=== tempmap - synthetic model ===\n");
    out.push_str(&format!(
        "Table: {} temperatures x {} channels ({})\n",
        key.n_temps,
        key.n_channels,
        origin_label(origin)
    ));
    out.push_str(&format!(
        "Axis: log T [{:.2}, {:.2}] step {}\n",
        axis.t0(),
        axis.t_max(),
        axis.step()
    ));
    out.push_str(&format!(
        "DEM: width {} | amplitude {} | reference channel {}\n",
        key.dem_width, key.dem_amplitude, key.reference_channel
    ));
    if let Some(p) = path {
        out.push_str(&format!("Cache: {}\n", p.display()));
    }
    out
}

/// Summary of a fitted map.
pub fn format_fit_summary(
    map: &TemperatureMap,
    goodness: &Field,
    origin: ModelOrigin,
    masked: Option<usize>,
) -> String {
    let (rows, cols) = map.shape();
    let mut out = String::new();
    out.push_str("=== tempmap - temperature fit ===\n");
    out.push_str(&format!("Image: {rows}x{cols} | model {}\n", origin_label(origin)));
    if let Some(d) = map.meta.date_obs {
        out.push_str(&format!("Date-obs: {d}\n"));
    }
    if let Some(m) = masked {
        out.push_str(&format!("Off-limb pixels masked: {m}\n"));
    }
    out.push_str(&stats_line(
        "Temperature",
        &field_stats(&map.data),
        map.scale().unit_label(),
    ));
    out.push_str(&stats_line("Goodness", &field_stats(goodness), ""));
    out
}

/// Summary of a synthetic validation run.
pub fn format_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str("=== tempmap - synthetic validation ===\n");
    out.push_str(&format!(
        "Pixels fitted: {}/{}\n",
        report.n_fitted, report.n_pixels
    ));
    out.push_str(&stats_line("Temperature error", &report.percent_error, "%"));
    out.push_str(&stats_line("Goodness", &report.goodness, ""));
    out
}
