//! Core analysis engine
//!
//! Loads an uploaded file into a [`Table`] and reduces it to three scalar
//! statistics. The outcome is a tagged [`Analysis`] value; parse and IO
//! failures are logged and folded into [`Analysis::ParseError`] rather than
//! propagated, so the HTTP layer can map every variant to a status code
//! deterministically.

pub mod stats;
pub mod table;

pub use table::{Column, Table, TableError};

use std::path::Path;
use tracing::warn;

/// Outcome of analyzing one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The file parsed and produced statistics. `correlation` is `None`
    /// when the source had fewer than two analyzable columns.
    Stats {
        mean: f64,
        median: f64,
        correlation: Option<f64>,
    },
    /// The file parsed but held no usable column.
    Empty,
    /// The file could not be parsed at all.
    ParseError(String),
}

impl Analysis {
    pub fn is_stats(&self) -> bool {
        matches!(self, Analysis::Stats { .. })
    }
}

/// Analyze a saved upload.
///
/// Column selection follows a two-tier rule: columns literally named `A`
/// and `B` when both exist, otherwise the first column alone (with no
/// correlation). An all-missing column yields NaN statistics; the storage
/// layer turns those into NULL.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Analysis {
    let path = path.as_ref();

    let loaded = match extension_of(path).as_deref() {
        Some("csv") => Table::from_csv(path),
        Some("xlsx") | Some("xls") => Table::from_excel(path),
        // Unreachable behind the upload gate, but the analyzer stands alone.
        _ => {
            return Analysis::ParseError(format!(
                "unsupported file type: {}",
                path.display()
            ))
        }
    };

    let table = match loaded {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse upload");
            return Analysis::ParseError(e.to_string());
        }
    };

    summarize(&table)
}

fn summarize(table: &Table) -> Analysis {
    if let (Some(a), Some(b)) = (table.column("A"), table.column("B")) {
        let values = a.numeric();
        let (xs, ys): (Vec<f64>, Vec<f64>) = a
            .values
            .iter()
            .zip(b.values.iter())
            .filter_map(|(x, y)| x.zip(*y))
            .unzip();

        return Analysis::Stats {
            mean: stats::mean(&values),
            median: stats::median(&values),
            correlation: Some(stats::pearson(&xs, &ys)),
        };
    }

    // The positional fallback needs at least one data row; a header-only
    // table is not analyzable. (The A/B tier above intentionally is not
    // gated on rows and yields NaN statistics for a header-only file.)
    match table.first_column() {
        Some(col) if !col.values.is_empty() => {
            let values = col.numeric();
            Analysis::Stats {
                mean: stats::mean(&values),
                median: stats::median(&values),
                correlation: None,
            }
        }
        _ => Analysis::Empty,
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
