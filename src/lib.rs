//! Tabstat - summary statistics for uploaded tabular files
//!
//! Tabstat accepts CSV and Excel uploads over HTTP, computes three scalar
//! statistics per file, and persists each result as a row in a SQLite
//! database served back as JSON.
//!
//! # Pipeline
//!
//! Every upload runs the same linear path:
//!
//! 1. **Ingestion** ([`ingest`]): the declared name must pass the
//!    `{csv, xlsx, xls}` allow-list, gets sanitized to a filesystem-safe
//!    key, and the raw bytes land in the upload directory.
//! 2. **Analysis** ([`analyzer`]): the saved file is parsed into a typed
//!    [`analyzer::Table`] and reduced to mean, median, and Pearson
//!    correlation. Columns named `A` and `B` drive all three; otherwise the
//!    first column drives mean/median and the correlation is absent.
//! 3. **Persistence** ([`db`]): a record is created only when analysis
//!    succeeded, then served by id or as a list.
//!
//! # Quick Start
//!
//! ```no_run
//! use tabstat::analyzer::{analyze_file, Analysis};
//!
//! match analyze_file("data.csv") {
//!     Analysis::Stats { mean, median, correlation } => {
//!         println!("mean={} median={} r={:?}", mean, median, correlation);
//!     }
//!     Analysis::Empty => println!("no usable column"),
//!     Analysis::ParseError(e) => println!("could not parse: {}", e),
//! }
//! ```
//!
//! # Modules
//!
//! - [`ingest`]: extension allow-list, filename sanitization, file writes
//! - [`analyzer`]: tabular parsing and descriptive statistics
//! - [`db`]: diesel-backed SQLite store for analysis records
//! - [`serve`]: tiny_http JSON API (upload / list / fetch / delete)
//! - [`config`]: env-overridable database and upload-directory settings

pub mod analyzer;
pub mod config;
pub mod db;
pub mod ingest;
pub mod schema;
pub mod serve;

pub use analyzer::{analyze_file, Analysis};
pub use config::Config;
pub use db::{AnalysisRecord, Database, DbError};
