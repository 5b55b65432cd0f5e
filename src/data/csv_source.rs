//! CSV export loading.
//!
//! Reads a deal or work-order export into a [`Table`]. Columns whose
//! every present value is a plain number are loaded as numeric cells so
//! that they count towards numeric totals.

use crate::models::{CellValue, Record, Table};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Load a CSV file into a table.
pub fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let table = read_csv(file)
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

    debug!(
        "Loaded {} rows, {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );

    Ok(table)
}

/// Parse CSV content from any reader.
pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV record {}", index + 1))?;
        let row = (0..headers.len())
            .map(|i| record.get(i).map(str::to_string))
            .collect();
        raw_rows.push(row);
    }

    let numeric_columns: Vec<bool> = (0..headers.len())
        .map(|i| is_numeric_column(raw_rows.iter().map(|row| row[i].as_deref())))
        .collect();

    let mut table = Table::with_columns(headers.clone());
    for raw in raw_rows {
        let record: Record = headers
            .iter()
            .zip(raw)
            .zip(&numeric_columns)
            .map(|((header, value), numeric)| {
                (header.clone(), typed_cell(value.as_deref(), *numeric))
            })
            .collect();
        table.push(record);
    }

    Ok(table)
}

/// Whether every present value parses as a plain number.
///
/// A column with no present values is not numeric.
fn is_numeric_column<'a>(values: impl Iterator<Item = Option<&'a str>>) -> bool {
    let mut seen = false;
    for value in values.flatten() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !matches!(value.parse::<f64>(), Ok(n) if n.is_finite()) {
            return false;
        }
        seen = true;
    }
    seen
}

fn typed_cell(value: Option<&str>, numeric: bool) -> CellValue {
    match CellValue::from_raw(value) {
        CellValue::Text(s) if numeric => s
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Text(s)),
        cell => cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_types() {
        let data = "Deal Name,Sector,Probability,Deal Amount\n\
                    Alpha,Mining,40,\"1,200\"\n\
                    Beta,,55,300\n";

        let table = read_csv(data.as_bytes()).unwrap();

        assert_eq!(
            table.columns,
            vec!["Deal Name", "Sector", "Probability", "Deal Amount"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["Probability"], CellValue::Number(40.0));
        // Thousands separators keep the column textual until normalization.
        assert_eq!(
            table.rows[0]["Deal Amount"],
            CellValue::Text("1,200".to_string())
        );
        assert_eq!(table.rows[1]["Sector"], CellValue::Missing);
    }

    #[test]
    fn test_short_rows_are_filled() {
        let data = "a,b,c\n1,2\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.rows[0]["c"], CellValue::Missing);
        assert_eq!(table.rows[0]["a"], CellValue::Number(1.0));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let table = read_csv("Deal Name,Sector\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn test_is_numeric_column() {
        assert!(is_numeric_column([Some("1"), None, Some(" 2.5 ")].into_iter()));
        assert!(!is_numeric_column([Some("1"), Some("x")].into_iter()));
        assert!(!is_numeric_column([None, Some("")].into_iter()));
    }

    #[test]
    fn test_load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Status,Amount").unwrap();
        writeln!(file, "Open,10").unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_csv(Path::new("/nonexistent/deals.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
