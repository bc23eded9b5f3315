//! Curator DB - Record store for curator on SQLite.
//!
//! One logical table of analyzed records, deduplicated by normalized URL
//! first and file name second, with whole-store import/export.

mod database;
mod dedup;
mod error;
mod migrations;
mod operations;
mod transfer;

pub use database::Database;
pub use dedup::{DedupIndex, DupReason};
pub use error::{DbError, DbResult};
pub use operations::AppendOutcome;
pub use transfer::ImportReport;
