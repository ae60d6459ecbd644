//! Spreadsheet and CSV reading.
//!
//! Only the first sheet is read. Its first row supplies the column headers;
//! every following row becomes a [`RawRow`] keyed by those headers, with
//! blank cells left out and fully blank rows skipped.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use radar_core::{parse_rows, ImportError};
use radar_schema::{MarketItem, RawRow};
use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("could not open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("unsupported file type '{0}' (expected .csv, .xlsx, .xls or .ods)")]
    UnsupportedFormat(String),
    #[error("the workbook has no sheets")]
    NoSheets,
}

/// Reading or validating an import file failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Read(#[from] WorkbookError),
    #[error(transparent)]
    Rows(#[from] ImportError),
    #[error("import task stopped: {0}")]
    Interrupted(String),
}

/// Read the first sheet of `path` into untyped rows.
pub fn read_workbook(path: &Path) -> Result<Vec<RawRow>, WorkbookError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let rows = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        other => return Err(WorkbookError::UnsupportedFormat(other.to_string())),
    };
    tracing::debug!(
        target: "market_radar::import",
        path = %path.display(),
        rows = rows.len(),
        "workbook.read"
    );
    Ok(rows)
}

/// Read `path` and validate its rows into items.
pub fn import_workbook(path: &Path) -> Result<Vec<MarketItem>, LoadError> {
    let rows = read_workbook(path)?;
    Ok(parse_rows(&rows)?)
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>, WorkbookError> {
    let file = File::open(path).map_err(|source| WorkbookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = build_row(&headers, record.iter().map(csv_value));
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn read_spreadsheet(path: &Path) -> Result<Vec<RawRow>, WorkbookError> {
    if !path.exists() {
        return Err(WorkbookError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        });
    }
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(WorkbookError::NoSheets)??;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_value(cell).as_str().map(str::trim).unwrap_or_default().to_string())
        .collect();

    Ok(sheet_rows
        .map(|cells| build_row(&headers, cells.iter().map(cell_value)))
        .filter(|row| !row.is_empty())
        .collect())
}

/// Zip headers with values, dropping unnamed columns and blank cells.
fn build_row(headers: &[String], values: impl Iterator<Item = Value>) -> RawRow {
    headers
        .iter()
        .zip(values)
        .filter(|(header, value)| !header.is_empty() && !value.is_null())
        .map(|(header, value)| (header.clone(), value))
        .collect()
}

/// CSV cells carry no types; numbers and booleans are recognised the way
/// spreadsheet tools do when opening a CSV.
fn csv_value(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::from(integer);
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    match trimmed.to_ascii_uppercase().as_str() {
        "TRUE" => Value::Bool(true),
        "FALSE" => Value::Bool(false),
        _ => Value::String(field.to_string()),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(value) => Value::from(*value),
        Data::Float(value) => Number::from_f64(*value).map_or(Value::Null, Value::Number),
        Data::String(text) if text.is_empty() => Value::Null,
        Data::String(text) => Value::String(text.clone()),
        Data::Bool(flag) => Value::Bool(*flag),
        Data::DateTime(value) => Number::from_f64(value.as_f64()).map_or(Value::Null, Value::Number),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Value::String(text.clone()),
        Data::Error(err) => Value::String(err.to_string()),
    }
}
