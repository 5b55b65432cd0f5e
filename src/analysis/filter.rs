//! Sector and keyword row filtering.

use crate::models::{Record, Table};

/// Keep rows where at least one cell contains `keyword`, ignoring case.
///
/// A `None` or blank keyword returns the table unchanged.
pub fn filter_by_keyword(table: Table, keyword: Option<&str>) -> Table {
    let keyword = match keyword.map(str::trim) {
        Some(k) if !k.is_empty() => k,
        _ => return table,
    };

    let needle = keyword.to_lowercase();

    let Table { columns, rows } = table;
    let rows = rows
        .into_iter()
        .filter(|row| row_contains(row, &needle))
        .collect();

    Table { columns, rows }
}

/// Whether any cell of `row` contains the lowercase `needle`.
pub fn row_contains(row: &Record, needle: &str) -> bool {
    row.values()
        .any(|cell| cell.to_string().to_lowercase().contains(needle))
}
