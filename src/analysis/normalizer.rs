//! Column cleaning.
//!
//! Fills absent cells with the `unknown` sentinel, coerces amount-like
//! columns to numbers and date-like columns to calendar dates, and
//! lowercases the remaining text. Nothing here fails: values that do not
//! parse degrade to per-cell markers.

use crate::models::{CellValue, Record, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Substrings that mark a column as holding amounts.
const NUMERIC_HINTS: &[&str] = &["value", "revenue", "amount"];

/// Substring that marks a column as holding dates.
const DATE_HINT: &str = "date";

const CURRENCY_SYMBOLS: &[char] = &['$', '₹', '€', '£', '¥'];

const CURRENCY_CODES: &[&str] = &["usd", "inr", "eur", "gbp", "rs.", "rs"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y", "%d %B %Y",
    "%b %d, %Y", "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// How a column's cells are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
}

impl ColumnKind {
    /// Classifies a column by its name.
    pub fn for_column(name: &str) -> Self {
        let lower = name.to_lowercase();
        if NUMERIC_HINTS.iter().any(|hint| lower.contains(hint)) {
            ColumnKind::Numeric
        } else if lower.contains(DATE_HINT) {
            ColumnKind::Date
        } else {
            ColumnKind::Text
        }
    }
}

/// Normalize every column of a table.
pub fn normalize_table(table: Table) -> Table {
    let kinds: Vec<(String, ColumnKind)> = table
        .columns
        .iter()
        .map(|c| (c.clone(), ColumnKind::for_column(c)))
        .collect();

    debug!(
        "Normalizing {} rows across {} columns",
        table.rows.len(),
        kinds.len()
    );

    let rows = table
        .rows
        .into_iter()
        .map(|row| normalize_record(row, &kinds))
        .collect();

    Table {
        columns: table.columns,
        rows,
    }
}

fn normalize_record(mut row: Record, kinds: &[(String, ColumnKind)]) -> Record {
    for (column, kind) in kinds {
        let cell = row.remove(column).unwrap_or(CellValue::Missing);
        row.insert(column.clone(), normalize_cell(cell, *kind));
    }
    row
}

/// Normalize a single cell for a column of the given kind.
pub fn normalize_cell(cell: CellValue, kind: ColumnKind) -> CellValue {
    let filled = match cell {
        CellValue::Missing => CellValue::Unknown,
        other => other,
    };

    match (kind, filled) {
        (ColumnKind::Numeric, CellValue::Number(n)) => CellValue::Number(n),
        (ColumnKind::Numeric, CellValue::Text(s)) => parse_amount(&s)
            .map(CellValue::Number)
            .unwrap_or(CellValue::NotANumber),
        (ColumnKind::Numeric, _) => CellValue::NotANumber,
        (ColumnKind::Date, CellValue::Date(d)) => CellValue::Date(d),
        (ColumnKind::Date, CellValue::Text(s)) => {
            parse_date(&s).map(CellValue::Date).unwrap_or(CellValue::NoDate)
        }
        (ColumnKind::Date, _) => CellValue::NoDate,
        (ColumnKind::Text, CellValue::Text(s)) => CellValue::Text(s.trim().to_lowercase()),
        (ColumnKind::Text, other) => other,
    }
}

/// Parse an amount such as `"1,200"`, `"$ 3,400.50"` or `"INR 12000"`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_lowercase();

    for code in CURRENCY_CODES {
        if let Some(rest) = s.strip_prefix(code) {
            s = rest.to_string();
            break;
        }
        if let Some(rest) = s.strip_suffix(code) {
            s = rest.to_string();
            break;
        }
    }

    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a calendar date from the formats commonly found in exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}
