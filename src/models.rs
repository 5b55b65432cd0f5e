//! Data models for the BI agent.
//!
//! This module contains the core data structures used throughout
//! the application for representing cells, records, tables, parsed
//! queries and aggregated summaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Placeholder written in place of an absent value.
///
/// Rendered lowercase so it groups with normalized text.
pub const UNKNOWN_SENTINEL: &str = "unknown";

/// A single cell of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Absent value, only present before normalization.
    Missing,
    /// Fixed sentinel substituted for an absent value.
    Unknown,
    /// Textual value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// An amount that could not be parsed as a number.
    NotANumber,
    /// A date that could not be parsed.
    NoDate,
}

impl CellValue {
    /// Builds a cell from raw source text; blank text is `Missing`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.trim().is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Missing,
        }
    }

    /// Whether this cell counts towards the missing-value tally.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            CellValue::Missing | CellValue::Unknown | CellValue::NotANumber | CellValue::NoDate
        )
    }

    /// Returns the numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Unknown => write!(f, "{}", UNKNOWN_SENTINEL),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::NotANumber => write!(f, "NaN"),
            CellValue::NoDate => write!(f, "no-date"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::from_raw(Some(s))
    }
}

/// One row of a table, keyed by column name.
pub type Record = HashMap<String, CellValue>;

/// An ordered sequence of records with a best-effort common column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in first-seen order.
    pub columns: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from records, collecting the union of their keys.
    ///
    /// Keys are ordered by first appearance, with each record's keys
    /// visited in sorted order since records carry no ordering.
    #[cfg(test)]
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            let mut keys: Vec<&String> = row.keys().collect();
            keys.sort();
            for key in keys {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Appends a row, registering any new columns.
    pub fn push(&mut self, row: Record) {
        for key in row.keys() {
            if !self.columns.contains(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cell at `column` for `row`, treating absent keys as `Missing`.
    pub fn cell<'a>(&self, row: &'a Record, column: &str) -> &'a CellValue {
        static MISSING: CellValue = CellValue::Missing;
        row.get(column).unwrap_or(&MISSING)
    }
}

/// Structured meaning extracted from a founder question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Sector keyword to filter on, if the question names one.
    #[serde(default)]
    pub sector: Option<String>,
    /// Metric the question is about.
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String {
    "general".to_string()
}

impl Default for QueryIntent {
    fn default() -> Self {
        Self {
            sector: None,
            metric: default_metric(),
        }
    }
}

/// Aggregates computed over a single table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSummary {
    /// Sum of all numeric cells.
    pub numeric_total: f64,
    /// Number of rows.
    pub rows: usize,
    /// Number of missing or sentinel cells.
    pub missing: usize,
    /// Occurrences of each distinct status value.
    pub status_counts: BTreeMap<String, usize>,
}

/// The digest of both tables handed to the prompt assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Sector filter that was applied.
    pub sector: Option<String>,
    /// Metric the question asked about.
    pub metric: String,
    /// Aggregates over the deal funnel.
    pub deals: TableSummary,
    /// Aggregates over the work-order tracker.
    pub work_orders: TableSummary,
}

impl Summary {
    /// Combines per-table aggregates with the parsed intent.
    pub fn new(intent: &QueryIntent, deals: TableSummary, work_orders: TableSummary) -> Self {
        Self {
            sector: intent.sector.clone(),
            metric: intent.metric.clone(),
            deals,
            work_orders,
        }
    }

    /// Total missing cells across both tables.
    pub fn missing_total(&self) -> usize {
        self.deals.missing + self.work_orders.missing
    }

    /// Whether neither table has any rows.
    pub fn is_empty(&self) -> bool {
        self.deals.rows == 0 && self.work_orders.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_cell_from_raw() {
        assert_eq!(CellValue::from_raw(None), CellValue::Missing);
        assert_eq!(CellValue::from_raw(Some("   ")), CellValue::Missing);
        assert_eq!(
            CellValue::from_raw(Some(" Mining ")),
            CellValue::Text(" Mining ".to_string())
        );
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(1200.0).to_string(), "1200");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Unknown.to_string(), "unknown");
        assert_eq!(CellValue::NotANumber.to_string(), "NaN");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-03-07");
    }

    #[test]
    fn test_is_missing() {
        assert!(CellValue::Missing.is_missing());
        assert!(CellValue::Unknown.is_missing());
        assert!(CellValue::NoDate.is_missing());
        assert!(!CellValue::Text("x".to_string()).is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
    }

    #[test]
    fn test_table_column_union() {
        let table = Table::from_records(vec![
            record(&[("b", "1"), ("a", "2")]),
            record(&[("c", "3"), ("a", "4")]),
        ]);
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(&table.rows[0], "c"), &CellValue::Missing);
    }

    #[test]
    fn test_intent_defaults() {
        let intent: QueryIntent = serde_json::from_str(r#"{"sector": null}"#).unwrap();
        assert_eq!(intent, QueryIntent::default());
    }

    #[test]
    fn test_summary_totals() {
        let deals = TableSummary {
            missing: 2,
            rows: 3,
            ..Default::default()
        };
        let work = TableSummary {
            missing: 1,
            ..Default::default()
        };
        let summary = Summary::new(&QueryIntent::default(), deals, work);
        assert_eq!(summary.missing_total(), 3);
        assert!(!summary.is_empty());
    }
}
