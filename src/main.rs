use clap::Parser;
use std::path::PathBuf;
use tabstat::config::{Config, DEFAULT_PORT};
use tabstat::db::Database;
use tabstat::serve::AppContext;
use tabstat::{ingest, serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tabstat")]
#[command(author, version, about = "Upload tabular data files and serve summary statistics over HTTP")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Connection string for the relational store (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Directory for uploaded files (overrides UPLOAD_FOLDER)
    #[arg(long)]
    upload_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    if let Some(upload_dir) = args.upload_dir {
        config.upload_dir = upload_dir;
    }

    if let Err(e) = ingest::ensure_upload_dir(&config.upload_dir) {
        eprintln!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let db = match Database::open(&config.database_url) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };

    let ctx = AppContext::new(db, config);
    if let Err(e) = serve::start(ctx, args.port) {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
