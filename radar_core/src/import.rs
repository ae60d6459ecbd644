//! Validation of spreadsheet rows into market items.

use std::collections::{HashMap, HashSet};

use radar_schema::{Category, Impact, MarketItem, RawRow};
use serde_json::Value;
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 4] = ["id", "text", "category", "impact"];

/// Spreadsheet row numbers are 1-based and the first row holds the headers.
const HEADER_ROWS: usize = 1;

/// A row that cannot become an item. The whole batch is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Row {row} is missing required columns (id, text, category, impact).")]
    MissingColumns { row: usize },
    #[error("Row {row} has invalid category or impact values.")]
    InvalidLabels { row: usize },
    #[error("Row {row} has an id that is not a whole number: '{value}'.")]
    InvalidId { row: usize, value: String },
    #[error("Row {row} repeats id {id}; ids must be unique.")]
    DuplicateId { row: usize, id: i64 },
}

impl ImportError {
    pub fn row(&self) -> usize {
        match self {
            ImportError::MissingColumns { row }
            | ImportError::InvalidLabels { row }
            | ImportError::InvalidId { row, .. }
            | ImportError::DuplicateId { row, .. } => *row,
        }
    }
}

/// Convert rows into items, failing on the first invalid row.
///
/// Header keys are matched case-insensitively and category/impact values are
/// mapped onto their canonical variants. Ids must be unique within the
/// batch. No positions are assigned.
pub fn parse_rows(rows: &[RawRow]) -> Result<Vec<MarketItem>, ImportError> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row_number = index + 1 + HEADER_ROWS;
            let item = parse_row(row_number, row)?;
            if !seen.insert(item.id) {
                return Err(ImportError::DuplicateId {
                    row: row_number,
                    id: item.id,
                });
            }
            Ok(item)
        })
        .collect()
}

fn parse_row(row_number: usize, row: &RawRow) -> Result<MarketItem, ImportError> {
    let lowered: HashMap<String, &Value> = row
        .iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect();
    let field = |name: &str| lowered.get(name).copied().filter(|value| is_present(value));

    let (Some(id), Some(text), Some(category), Some(impact)) = (
        field("id"),
        field("text"),
        field("category"),
        field("impact"),
    ) else {
        return Err(ImportError::MissingColumns { row: row_number });
    };

    let category = Category::from_label(&value_text(category));
    let impact = Impact::from_label(&value_text(impact));
    let (Some(category), Some(impact)) = (category, impact) else {
        return Err(ImportError::InvalidLabels { row: row_number });
    };

    let id = coerce_id(id).ok_or_else(|| ImportError::InvalidId {
        row: row_number,
        value: value_text(id),
    })?;

    Ok(MarketItem::new(id, value_text(text), category, impact))
}

/// Blank cells, zeros and `false` count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn coerce_id(value: &Value) -> Option<i64> {
    let whole = |n: f64| (n.is_finite() && n.fract() == 0.0).then_some(n as i64);
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(whole)),
        Value::String(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(whole))
        }
        Value::Bool(true) => Some(1),
        _ => None,
    }
}
