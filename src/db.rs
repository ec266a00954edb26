//! SQLite database with Diesel ORM
//!
//! One table: `analysis_results`, one row per successfully analyzed upload.
//! The schema is created at startup with `CREATE TABLE IF NOT EXISTS`; the
//! timestamp is stamped here at insert and never mutated afterwards.

use crate::schema::analysis_results;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Error type for database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(#[from] diesel::result::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Insertable analysis record.
#[derive(Insertable)]
#[diesel(table_name = analysis_results)]
struct NewAnalysisRecord<'a> {
    filename: &'a str,
    mean_value: Option<f64>,
    median_value: Option<f64>,
    correlation: Option<f64>,
    timestamp: &'a str,
}

/// Queryable analysis record. Serializes directly to the wire shape:
/// `{id, filename, mean_value, median_value, correlation, timestamp}`.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = analysis_results)]
pub struct AnalysisRecord {
    pub id: i32,
    pub filename: String,
    pub mean_value: Option<f64>,
    pub median_value: Option<f64>,
    pub correlation: Option<f64>,
    pub timestamp: String,
}

/// Database connection wrapper with connection pool.
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database behind the given connection string and
    /// make sure the schema exists.
    pub fn open(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool
            .get()
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                filename TEXT NOT NULL,
                mean_value REAL,
                median_value REAL,
                correlation REAL,
                timestamp TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut conn)?;

        Ok(())
    }

    /// Store a successful analysis, returning the new record id.
    ///
    /// NaN statistics (an all-missing column, an undefined correlation)
    /// are stored as NULL.
    pub fn insert_result(
        &self,
        filename: &str,
        mean: f64,
        median: f64,
        correlation: Option<f64>,
    ) -> Result<i32> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let new_record = NewAnalysisRecord {
            filename,
            mean_value: finite_or_null(mean),
            median_value: finite_or_null(median),
            correlation: correlation.and_then(finite_or_null),
            timestamp: &now,
        };

        diesel::insert_into(analysis_results::table)
            .values(&new_record)
            .execute(&mut conn)?;

        let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
            "last_insert_rowid()",
        ))
        .first(&mut conn)?;

        Ok(id)
    }

    /// Fetch one record by id.
    pub fn get_result(&self, id: i32) -> Result<Option<AnalysisRecord>> {
        let mut conn = self.get_conn()?;

        let record = analysis_results::table
            .filter(analysis_results::id.eq(id))
            .first::<AnalysisRecord>(&mut conn)
            .optional()?;

        Ok(record)
    }

    /// Fetch all records in storage order.
    pub fn get_results(&self) -> Result<Vec<AnalysisRecord>> {
        let mut conn = self.get_conn()?;

        let records = analysis_results::table
            .order(analysis_results::id.asc())
            .load::<AnalysisRecord>(&mut conn)?;

        Ok(records)
    }

    /// Hard-delete one record inside a transaction. Returns the number of
    /// rows removed; a failed commit rolls back automatically.
    pub fn delete_result(&self, id: i32) -> Result<usize> {
        let mut conn = self.get_conn()?;

        let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(analysis_results::table.filter(analysis_results::id.eq(id)))
                .execute(conn)
        })?;

        Ok(deleted)
    }
}

/// SQLite has no NaN; map undefined statistics to NULL at the boundary.
fn finite_or_null(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn insert_then_fetch_round_trips_every_field() {
        let (_dir, db) = test_db();

        let id = db.insert_result("data.csv", 2.0, 2.0, Some(1.0)).unwrap();
        let record = db.get_result(id).unwrap().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.filename, "data.csv");
        assert_eq!(record.mean_value, Some(2.0));
        assert_eq!(record.median_value, Some(2.0));
        assert_eq!(record.correlation, Some(1.0));
        assert!(!record.timestamp.is_empty());
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let (_dir, db) = test_db();

        let first = db.insert_result("a.csv", 1.0, 1.0, None).unwrap();
        let second = db.insert_result("b.csv", 2.0, 2.0, None).unwrap();
        assert!(second > first);
    }

    #[test]
    fn missing_correlation_stays_null() {
        let (_dir, db) = test_db();

        let id = db.insert_result("x.csv", 25.0, 25.0, None).unwrap();
        let record = db.get_result(id).unwrap().unwrap();

        assert_eq!(record.mean_value, Some(25.0));
        assert_eq!(record.median_value, Some(25.0));
        assert!(record.correlation.is_none());
    }

    #[test]
    fn nan_statistics_become_null() {
        let (_dir, db) = test_db();

        let id = db
            .insert_result("blank.csv", f64::NAN, f64::NAN, Some(f64::NAN))
            .unwrap();
        let record = db.get_result(id).unwrap().unwrap();

        assert!(record.mean_value.is_none());
        assert!(record.median_value.is_none());
        assert!(record.correlation.is_none());
    }

    #[test]
    fn get_results_lists_everything_in_storage_order() {
        let (_dir, db) = test_db();

        for name in ["a.csv", "b.csv", "c.csv"] {
            db.insert_result(name, 1.0, 1.0, None).unwrap();
        }

        let records = db.get_results().unwrap();
        assert_eq!(records.len(), 3);
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
    }

    #[test]
    fn unknown_id_fetches_none() {
        let (_dir, db) = test_db();
        assert!(db.get_result(999).unwrap().is_none());
    }

    #[test]
    fn delete_removes_the_record() {
        let (_dir, db) = test_db();

        let id = db.insert_result("gone.csv", 2.0, 2.0, Some(1.0)).unwrap();
        assert_eq!(db.delete_result(id).unwrap(), 1);
        assert!(db.get_result(id).unwrap().is_none());
    }

    #[test]
    fn delete_of_unknown_id_removes_nothing() {
        let (_dir, db) = test_db();
        assert_eq!(db.delete_result(42).unwrap(), 0);
    }
}
