use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use coronatemps::app::pipeline::{FitInputs, run_fit};
use coronatemps::data::ImageStack;
use coronatemps::domain::{ChannelMeta, DiskGeometry, Field, TempMapConfig, TemperatureScale};
use coronatemps::fit::{TemperatureAxis, fit_pixels};
use coronatemps::io::{ModelCache, read_field_csv, read_sidecar, write_field_csv};
use coronatemps::models::{
    ModelKey, ModelOrigin, ResponseCurve, ResponseTable, build_model, build_or_load_model,
};

fn responses() -> ResponseTable {
    let grid: Vec<f64> = (0..40).map(|i| 5.6 + i as f64 * 0.025).collect();
    let curves = [(0.2, 6.0), (1.0, 6.2), (0.1, 6.5)]
        .iter()
        .enumerate()
        .map(|(i, &(slope, pivot))| ResponseCurve {
            name: format!("ch{i}"),
            values: grid
                .iter()
                .map(|t| 1.0 / (1.0 + (-(t - pivot) / slope).exp()) + 0.01)
                .collect(),
        })
        .collect();
    ResponseTable::new(5.6, 0.025, curves).unwrap()
}

fn write_responses_json(path: &Path, table: &ResponseTable) {
    let channels: Vec<_> = table
        .curves()
        .iter()
        .map(|c| serde_json::json!({ "name": c.name, "offset": 0, "values": c.values }))
        .collect();
    let doc = serde_json::json!({
        "log_t_start": table.log_t_start(),
        "log_t_step": table.log_t_step(),
        "len": table.len(),
        "channels": channels,
    });
    fs::write(path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

fn config(cache_dir: &Path) -> TempMapConfig {
    TempMapConfig {
        t0: 5.8,
        t_max: 6.25,
        t_step: 0.05,
        n_channels: 3,
        reference_channel: 1,
        cache_dir: cache_dir.to_path_buf(),
        response_correction: None,
        ..TempMapConfig::default()
    }
}

#[test]
fn single_pixel_matching_a_row_recovers_its_temperature() {
    let axis = TemperatureAxis::new(5.8, 6.25, 0.05).unwrap();
    assert_eq!(axis.len(), 10);
    let key = ModelKey::new(&axis, 3, 1, 0.1, 1.0);
    let model = build_model(&responses(), &key).unwrap();

    let row = model.row(4);
    let channels = row.iter().map(|&v| Field::from_element(1, 1, v)).collect();
    let meta = (0..3).map(|i| ChannelMeta::new(format!("ch{i}"), 1.0)).collect();
    let stack = ImageStack::new(channels, meta).unwrap();

    let out = fit_pixels(&stack, &model, axis.values()).unwrap();
    assert_eq!(out.temperature.data[(0, 0)], axis.values()[4]);
    assert_relative_eq!(out.goodness[(0, 0)], 0.0, epsilon = 1e-12);
}

#[test]
fn cache_round_trip_through_the_builder() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ModelCache::new(dir.path());
    let axis = TemperatureAxis::new(5.8, 6.25, 0.05).unwrap();
    let key = ModelKey::new(&axis, 3, 1, 0.1, 1.0);

    let (built, origin) = build_or_load_model(|| Ok(responses()), &key, &cache, false).unwrap();
    assert_eq!(origin, ModelOrigin::Built);
    assert!(cache.path_for(&key).ends_with("synth_emiss_1pars_10x3_f32.bin"));

    let (loaded, origin) = build_or_load_model(
        || panic!("responses must not be read on a warm cache"),
        &key,
        &cache,
        false,
    )
    .unwrap();
    assert_eq!(origin, ModelOrigin::Cache);
    assert_eq!(built.to_row_major(), loaded.to_row_major());
}

#[test]
fn fit_pipeline_writes_a_masked_map() {
    let dir = tempfile::tempdir().unwrap();
    let table = responses();
    let resp_path = dir.path().join("responses.json");
    write_responses_json(&resp_path, &table);
    let config = config(&dir.path().join("cache"));

    // 5x5 image; every pixel sits on one model row, chosen by column.
    let axis = config.axis().unwrap();
    let key = ModelKey::from_config(&config, &axis);
    let model = build_model(&table, &key).unwrap();
    let exposures = [2.0, 1.0, 4.0];
    let mut channel_paths = Vec::new();
    for (c, exposure) in exposures.iter().enumerate() {
        let field = Field::from_fn(5, 5, |_, col| model.value(col * 2, c) * exposure * 100.0);
        let path = dir.path().join(format!("ch{c}.csv"));
        write_field_csv(&path, &field).unwrap();
        channel_paths.push(path);
    }

    let inputs = FitInputs {
        responses: resp_path,
        channels: channel_paths,
        exposures: exposures.to_vec(),
        disk: Some(DiskGeometry {
            center_x: 2.0,
            center_y: 2.0,
            radius_px: 1.5,
        }),
        date_obs: NaiveDate::from_ymd_opt(2011, 2, 15).and_then(|d| d.and_hms_opt(1, 56, 0)),
        scale: TemperatureScale::Log,
        out_dir: dir.path().join("out"),
        force: false,
    };

    let run = run_fit(&config, &inputs).unwrap();
    assert_eq!(run.origin, ModelOrigin::Built);
    // 1.5 * 1.15 = 1.725: the center, its 4 neighbors and the 4 diagonals
    // (r = 1.414) survive, the remaining 16 pixels are masked.
    assert_eq!(run.masked, Some(16));

    let t = read_field_csv(&run.export.temperature).unwrap();
    assert!(t[(0, 0)].is_nan());
    for col in 1..4 {
        assert_relative_eq!(t[(2, col)], axis.values()[col * 2], epsilon = 1e-12);
    }

    let side = read_sidecar(&run.export.meta).unwrap();
    assert_eq!(side.meta.instrument, "temperature");
    assert_eq!(side.meta.disk, inputs.disk);
    assert_eq!(side.temperature.n_valid, 9);
    assert_eq!(side.meta.date_obs, inputs.date_obs);
    assert_eq!(side.meta.reference_channel.as_ref().map(|c| c.name.as_str()), Some("ch1"));
    let raw = fs::read_to_string(&run.export.meta).unwrap();
    assert!(raw.contains("2011-02-15T01:56:00"), "{raw}");

    // Second run hits the cache and converts to MK.
    let inputs = FitInputs {
        scale: TemperatureScale::Linear,
        disk: None,
        ..inputs
    };
    let run = run_fit(&config, &inputs).unwrap();
    assert_eq!(run.origin, ModelOrigin::Cache);
    assert_eq!(run.masked, None);
    assert_relative_eq!(
        run.temperature.data[(0, 0)],
        10f64.powf(axis.values()[0]) / 1e6,
        max_relative = 1e-9
    );
}

#[test]
fn missing_response_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let path = dir.path().join("img.csv");
    write_field_csv(&path, &Field::from_element(2, 2, 1.0)).unwrap();

    let inputs = FitInputs {
        responses: dir.path().join("missing.json"),
        channels: vec![path.clone(), path.clone(), path],
        exposures: vec![1.0; 3],
        disk: None,
        date_obs: None,
        scale: TemperatureScale::Log,
        out_dir: dir.path().join("out"),
        force: false,
    };
    let err = run_fit(&config, &inputs).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!dir.path().join("synth_emiss_1pars_10x3_f32.bin").exists());
}
