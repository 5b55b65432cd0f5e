//! Table aggregation and statistics.
//!
//! This module computes the scalar digest of a table that is handed to
//! the prompt assembler: numeric totals, row counts, missing-value counts
//! and a status histogram.

use crate::models::{Table, TableSummary};
use std::collections::BTreeMap;

/// Sum every numeric cell in the table.
///
/// Marker cells are skipped, so a table with no numeric cells sums to zero.
pub fn numeric_total(table: &Table) -> f64 {
    table
        .rows
        .iter()
        .flat_map(|row| row.values())
        .filter_map(|cell| cell.as_number())
        .filter(|n| n.is_finite())
        .sum()
}

/// Count missing or sentinel cells, including columns absent from a row.
pub fn missing_count(table: &Table) -> usize {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .filter(|column| table.cell(row, column).is_missing())
                .count()
        })
        .sum()
}

/// Resolve which column holds statuses.
///
/// An explicitly configured name wins when the table has it (compared
/// case-insensitively); otherwise the first column whose name contains
/// `status` is used.
pub fn resolve_status_column<'a>(table: &'a Table, preferred: Option<&str>) -> Option<&'a str> {
    if let Some(preferred) = preferred {
        let wanted = preferred.trim().to_lowercase();
        if let Some(column) = table.columns.iter().find(|c| c.to_lowercase() == wanted) {
            return Some(column.as_str());
        }
    }

    table
        .columns
        .iter()
        .find(|c| c.to_lowercase().contains("status"))
        .map(String::as_str)
}

/// Count occurrences of each distinct value in the status column.
pub fn status_histogram(table: &Table, status_column: Option<&str>) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    let Some(column) = resolve_status_column(table, status_column) else {
        return counts;
    };

    for row in &table.rows {
        *counts
            .entry(table.cell(row, column).to_string())
            .or_default() += 1;
    }

    counts
}

/// Compute all aggregates for one table.
pub fn summarize_table(table: &Table, status_column: Option<&str>) -> TableSummary {
    TableSummary {
        numeric_total: numeric_total(table),
        rows: table.len(),
        missing: missing_count(table),
        status_counts: status_histogram(table, status_column),
    }
}

/// Render a status histogram as `value: count` pairs, most frequent first.
pub fn format_status_counts(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return "n/a".to_string();
    }

    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    entries
        .into_iter()
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect::<Vec<_>>()
        .join(", ")
}
