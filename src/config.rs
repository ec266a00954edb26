//! Service configuration
//!
//! Everything is env-overridable with local defaults: `DATABASE_URL` for the
//! relational store and `UPLOAD_FOLDER` for saved uploads. CLI flags win
//! over the environment.

use std::env;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "tabstat.db";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_PORT: u16 = 3001;

/// Resolved configuration, built once at startup and carried in the
/// application context.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the relational store.
    pub database_url: String,
    /// Directory uploads are written to, created at startup if absent.
    pub upload_dir: PathBuf,
}

impl Config {
    /// Read configuration from the environment, falling back to local
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            upload_dir: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}
