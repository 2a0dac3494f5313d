//! Response-table ingest.
//!
//! Two formats, picked by file extension:
//!
//! - `.json`: `{ "log_t_start", "log_t_step", "len", "channels": [{ "name", "offset", "values" }] }`
//!   Each channel is zero-padded into a `len`-sample grid starting at `offset`,
//!   which lets instrument tables that only cover part of the temperature range
//!   share one wide grid.
//! - anything else is read as CSV: header `log_t,<channel>,...`, one row per
//!   grid sample, `log_t` evenly spaced.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::TempMapConfig;
use crate::models::{ResponseCurve, ResponseError, ResponseTable};

/// Relative tolerance on the CSV grid spacing.
const GRID_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFile {
    pub log_t_start: f64,
    pub log_t_step: f64,
    pub len: usize,
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default)]
    pub offset: usize,
    pub values: Vec<f64>,
}

impl ResponseFile {
    /// Expand the padded channel layout into a table.
    pub fn into_table(self) -> Result<ResponseTable, ResponseError> {
        let len = self.len;
        let mut curves = Vec::with_capacity(self.channels.len());
        for ch in self.channels {
            let Some(end) = ch.offset.checked_add(ch.values.len()).filter(|&e| e <= len) else {
                return Err(ResponseError::OutOfBounds {
                    name: ch.name,
                    offset: ch.offset,
                    count: ch.values.len(),
                    len,
                });
            };
            let mut values = vec![0.0; len];
            values[ch.offset..end].copy_from_slice(&ch.values);
            curves.push(ResponseCurve {
                name: ch.name,
                values,
            });
        }
        ResponseTable::new(self.log_t_start, self.log_t_step, curves)
    }
}

/// Read a response table without any checks against the run configuration.
pub fn read_response_table(path: &Path) -> Result<ResponseTable, ResponseError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        read_json(path)
    } else {
        read_csv(path)
    }
}

/// Read, check the channel count, and apply the configured correction.
pub fn load_responses(path: &Path, config: &TempMapConfig) -> Result<ResponseTable, ResponseError> {
    let table = read_response_table(path)?;
    table.expect_channels(config.n_channels)?;
    log::info!(
        "Loaded {} response curves ({} samples, log T {:.2} + {:.3}·i) from {}",
        table.n_channels(),
        table.len(),
        table.log_t_start(),
        table.log_t_step(),
        path.display()
    );
    Ok(match &config.response_correction {
        Some(c) => {
            log::debug!(
                "Scaling channel {} by {} below log T {}",
                c.channel,
                c.factor,
                c.below_log_t
            );
            table.with_correction(c)
        }
        None => table,
    })
}

fn read_err(path: &Path, reason: impl ToString) -> ResponseError {
    ResponseError::Read {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn read_json(path: &Path) -> Result<ResponseTable, ResponseError> {
    let file = File::open(path).map_err(|e| read_err(path, e))?;
    let parsed: ResponseFile = serde_json::from_reader(file).map_err(|e| read_err(path, e))?;
    parsed.into_table()
}

fn read_csv(path: &Path) -> Result<ResponseTable, ResponseError> {
    let file = File::open(path).map_err(|e| read_err(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| read_err(path, e))?.clone();
    if headers.len() < 2 {
        return Err(ResponseError::NoChannels);
    }

    let mut log_t = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len() - 1];
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| read_err(path, e))?;
        let line = idx + 2;
        let mut fields = record.iter().map(|f| {
            f.parse::<f64>()
                .map_err(|e| read_err(path, format!("line {line}: '{f}': {e}")))
        });
        let Some(t) = fields.next() else {
            continue;
        };
        log_t.push(t?);
        for col in columns.iter_mut() {
            let v = fields
                .next()
                .ok_or_else(|| read_err(path, format!("line {line}: missing column")))??;
            col.push(v);
        }
    }

    if log_t.len() < 2 {
        return Err(ResponseError::InvalidGrid);
    }
    let step = log_t[1] - log_t[0];
    if !(step > 0.0) {
        return Err(ResponseError::InvalidGrid);
    }
    for (index, w) in log_t.windows(2).enumerate() {
        if ((w[1] - w[0]) - step).abs() > GRID_TOLERANCE * step.max(1.0) {
            return Err(ResponseError::UnevenGrid { index: index + 1 });
        }
    }

    let curves = headers
        .iter()
        .skip(1)
        .zip(columns)
        .map(|(name, values)| ResponseCurve {
            name: name.to_string(),
            values,
        })
        .collect();
    ResponseTable::new(log_t[0], step, curves)
}
