//! Command implementations.

pub mod config;
pub mod delete;
pub mod export;
pub mod import;
pub mod ingest;
pub mod init;
pub mod list;
pub mod stats;

use anyhow::Result;
use curator_config::AppPaths;
use curator_db::Database;

/// Open the record store at the standard location.
pub fn open_database() -> Result<Database> {
    let paths = app_paths()?;
    Ok(Database::open(&paths.database_file)?)
}

pub fn app_paths() -> Result<AppPaths> {
    AppPaths::new().ok_or_else(|| anyhow::anyhow!("Could not determine application directories"))
}
