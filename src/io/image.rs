//! Plain-text image grids.
//!
//! One CSV row per image row, no header. Missing pixels may be written as
//! `nan` or left empty; both read back as NaN.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Field;
use crate::error::AppError;

/// Read a headerless CSV grid into a field.
pub fn read_field_csv(path: &Path) -> Result<Field, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open image '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut values = Vec::new();
    let mut cols = None;
    let mut rows = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::config(format!("Invalid image CSV '{}': {e}", path.display()))
        })?;
        match cols {
            None => cols = Some(record.len()),
            Some(c) if c != record.len() => {
                return Err(AppError::config(format!(
                    "Image '{}' row {} has {} columns, expected {c}",
                    path.display(),
                    row + 1,
                    record.len()
                )));
            }
            Some(_) => {}
        }
        for cell in record.iter() {
            values.push(parse_cell(cell).ok_or_else(|| {
                AppError::config(format!(
                    "Image '{}' row {}: cannot parse '{cell}'",
                    path.display(),
                    row + 1
                ))
            })?);
        }
        rows += 1;
    }

    let cols = cols.unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Err(AppError::config(format!("Image '{}' is empty", path.display())));
    }
    Ok(Field::from_row_slice(rows, cols, &values))
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

/// Write a field as a headerless CSV grid.
pub fn write_field_csv(path: &Path, field: &Field) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create '{}': {e}", path.display())))?;

    let mut line = String::new();
    for row in field.row_iter() {
        line.clear();
        for (i, v) in row.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            if v.is_nan() {
                line.push_str("nan");
            } else {
                line.push_str(&format!("{v}"));
            }
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::config(format!("Failed to write '{}': {e}", path.display())))?;
    }
    Ok(())
}
