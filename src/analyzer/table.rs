//! Typed tabular parse result
//!
//! Both loaders produce the same in-memory shape: named columns of
//! `Option<f64>` cells, with `None` for blank or non-numeric values. The
//! first row of the source is always treated as the header row.

use calamine::{open_workbook_auto, DataType, Reader};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a file into a [`Table`].
///
/// The analyzer converts all of these into its "no result" outcome; they
/// never cross the HTTP boundary.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("workbook contains no sheets")]
    NoSheets,
}

/// One named column of numeric cells. Missing values stay in place so that
/// pairwise operations line up row-by-row across columns.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// The non-missing values, in row order.
    pub fn numeric(&self) -> Vec<f64> {
        self.values.iter().filter_map(|v| *v).collect()
    }
}

/// A parsed tabular file: columns in source order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Look up a column by its exact header name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The leftmost column, if any.
    pub fn first_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the source had no columns at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Load a CSV file. The first record is the header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column { name, values: Vec::new() })
            .collect();

        for record in reader.records() {
            let record = record?;
            for (i, col) in columns.iter_mut().enumerate() {
                col.values.push(record.get(i).and_then(parse_cell));
            }
        }

        Ok(Self { columns })
    }

    /// Load the first worksheet of an Excel workbook (.xlsx or .xls).
    pub fn from_excel<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(TableError::NoSheets)??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
            None => return Ok(Self::default()),
        };

        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column { name, values: Vec::new() })
            .collect();

        for row in rows {
            for (i, col) in columns.iter_mut().enumerate() {
                let cell = row.get(i).and_then(|c| {
                    c.as_f64()
                        .or_else(|| c.as_string().as_deref().and_then(|s| parse_cell(s)))
                });
                col.values.push(cell);
            }
        }

        Ok(Self { columns })
    }
}

/// Numeric cell parse. Blank and non-numeric cells are missing values,
/// matching how the statistics treat them.
fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_named_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "ab.csv", "A,B\n1,4\n2,5\n3,6\n");

        let table = Table::from_csv(&path).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column("A").unwrap().numeric(), vec![1.0, 2.0, 3.0]);
        assert_eq!(table.column("B").unwrap().numeric(), vec![4.0, 5.0, 6.0]);
        assert!(table.column("C").is_none());
    }

    #[test]
    fn csv_blank_and_text_cells_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "gaps.csv", "A,B\n1,\n,5\nx,6\n");

        let table = Table::from_csv(&path).unwrap();
        let a = table.column("A").unwrap();
        assert_eq!(a.values, vec![Some(1.0), None, None]);
        assert_eq!(a.numeric(), vec![1.0]);
    }

    #[test]
    fn empty_csv_has_no_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "empty.csv", "");

        let table = Table::from_csv(&path).unwrap();
        assert!(table.is_empty());
        assert!(table.first_column().is_none());
    }

    #[test]
    fn header_only_csv_has_columns_but_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "header.csv", "X,Y\n");

        let table = Table::from_csv(&path).unwrap();
        assert_eq!(table.column_count(), 2);
        assert!(table.column("X").unwrap().values.is_empty());
    }

    #[test]
    fn first_column_follows_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "order.csv", "X,A\n10,1\n20,2\n");

        let table = Table::from_csv(&path).unwrap();
        assert_eq!(table.first_column().unwrap().name, "X");
    }

    #[test]
    fn garbage_excel_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "fake.xlsx", "this is not a workbook");

        assert!(Table::from_excel(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Table::from_csv("/nonexistent/nope.csv").is_err());
    }
}
