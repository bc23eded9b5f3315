//! Whole-store export and merge import.
//!
//! The exchange format is a plain SQLite database file containing the
//! `records` table; imports are staged to a temp file and merged row by
//! row through the same dedup rules as [`Database::append`].

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::operations::{decode_list, encode_list};
use curator_core::NewRecord;
use rusqlite::backup::Backup;
use rusqlite::{params, Connection};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Leading bytes of every SQLite 3 database file.
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

const REQUIRED_COLUMNS: [&str; 6] =
    ["fileName", "fechaEnvio", "tematica", "etiquetas", "contenido", "urls"];

/// Result of a merge import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl Database {
    /// Serialize the current store into a downloadable blob.
    pub fn export(&self) -> DbResult<Vec<u8>> {
        let staging = tempfile::NamedTempFile::new().map_err(|e| DbError::Other(e.to_string()))?;

        {
            let src = self.conn()?;
            let mut dst = Connection::open(staging.path())?;
            let backup = Backup::new(&src, &mut dst)?;
            backup.run_to_completion(100, Duration::from_millis(5), None)?;
        }

        let bytes = std::fs::read(staging.path()).map_err(|e| DbError::Other(e.to_string()))?;
        info!(bytes = bytes.len(), "Exported record store");
        Ok(bytes)
    }

    /// Export and additionally drop a dated copy into `dir`, best effort.
    /// A failed copy is logged and swallowed; the returned blob is still
    /// good.
    pub fn export_with_copy(&self, dir: &Path) -> DbResult<Vec<u8>> {
        let bytes = self.export()?;

        let stamped = dir.join(format!(
            "records-{}.db",
            chrono::Local::now().format("%Y-%m-%d")
        ));
        let write = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&stamped, &bytes));
        if let Err(e) = write {
            warn!(path = %stamped.display(), error = %e, "Could not write dated export copy");
        }

        Ok(bytes)
    }

    /// Open `blob` as a second store and merge its rows into this one.
    ///
    /// Each row passes through the URL-then-filename dedup check against
    /// the live index (updated as rows land); survivors are inserted in a
    /// single transaction. Malformed JSON cells degrade to empty arrays
    /// rather than failing the row.
    pub fn import_merge(&self, blob: &[u8]) -> DbResult<ImportReport> {
        if !blob.starts_with(SQLITE_MAGIC) {
            return Err(DbError::InvalidImport(
                "File is not a SQLite database".to_string(),
            ));
        }

        let mut staging =
            tempfile::NamedTempFile::new().map_err(|e| DbError::Other(e.to_string()))?;
        staging
            .write_all(blob)
            .and_then(|_| staging.flush())
            .map_err(|e| DbError::Other(e.to_string()))?;

        let external = Connection::open(staging.path())?;
        validate_columns(&external)?;

        let mut report = ImportReport::default();
        let mut incoming: Vec<NewRecord> = Vec::new();

        {
            let mut stmt = external.prepare(
                "SELECT fileName, fechaEnvio, tematica, etiquetas, contenido, urls FROM records
                 ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                let tags_json: String = row.get(3)?;
                let urls_json: String = row.get(5)?;
                Ok(NewRecord {
                    source_name: row.get(0)?,
                    sent_at: row.get(1)?,
                    topic: row.get(2)?,
                    tags: decode_list(&tags_json),
                    summary_html: row.get(4)?,
                    urls: decode_list(&urls_json),
                })
            })?;

            for row in rows {
                match row {
                    Ok(record) => incoming.push(record),
                    Err(e) => {
                        report.skipped += 1;
                        report.errors.push(format!("Unreadable row: {e}"));
                    }
                }
            }
        }

        let mut index = self.load_dedup_index()?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for record in &incoming {
            if let Some(reason) = index.duplicate_reason(record) {
                debug!(source = %record.source_name, reason = ?reason, "Import: skipping duplicate");
                report.skipped += 1;
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO records (fileName, fechaEnvio, tematica, etiquetas, contenido, urls)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.source_name,
                    record.sent_at,
                    record.topic,
                    encode_list(&record.tags)?,
                    record.summary_html,
                    encode_list(&record.urls)?,
                ],
            )?;
            index.insert(&record.source_name, &record.urls);
            report.imported += 1;
        }

        tx.commit()?;
        info!(
            imported = report.imported,
            skipped = report.skipped,
            "Import merge finished"
        );
        Ok(report)
    }
}

fn validate_columns(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(records)")
        .map_err(|_| DbError::InvalidImport("Missing records table".to_string()))?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    if columns.is_empty() {
        return Err(DbError::InvalidImport("Missing records table".to_string()));
    }

    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            return Err(DbError::InvalidImport(format!(
                "Missing required column: {required}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::NewRecord;

    fn record(name: &str, urls: &[&str]) -> NewRecord {
        NewRecord {
            source_name: name.to_string(),
            sent_at: "2024-01-01 12:00:00".to_string(),
            topic: "Tech".to_string(),
            tags: vec!["rust".to_string()],
            summary_html: "<p>summary</p>".to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_export_blob_has_sqlite_signature() {
        let db = Database::open_in_memory().unwrap();
        db.append(&[record("a.eml", &["https://example.com/1"])]).unwrap();

        let blob = db.export().unwrap();
        assert!(blob.starts_with(SQLITE_MAGIC));
    }

    #[test]
    fn test_round_trip_into_empty_store() {
        let src = Database::open_in_memory().unwrap();
        src.append(&[
            record("a.eml", &["https://example.com/1"]),
            record("b.eml", &["https://example.com/2"]),
            record("c.eml", &[]),
        ])
        .unwrap();

        let blob = src.export().unwrap();

        let dst = Database::open_in_memory().unwrap();
        let report = dst.import_merge(&blob).unwrap();
        assert_eq!(report.imported, 3);
        assert_eq!(report.skipped, 0);
        assert!(report.errors.is_empty());
        assert_eq!(dst.count().unwrap(), 3);
    }

    #[test]
    fn test_import_skips_existing_duplicates() {
        let src = Database::open_in_memory().unwrap();
        src.append(&[
            record("a.eml", &["https://example.com/1"]),
            record("b.eml", &["https://example.com/2"]),
        ])
        .unwrap();
        let blob = src.export().unwrap();

        let dst = Database::open_in_memory().unwrap();
        // Same URL as a.eml under a different name: still a duplicate.
        dst.append(&[record("other.eml", &["https://example.com/1?utm_source=x"])])
            .unwrap();

        let report = dst.import_merge(&blob).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(dst.count().unwrap(), 2);
    }

    #[test]
    fn test_import_rejects_non_sqlite_blob() {
        let db = Database::open_in_memory().unwrap();
        let result = db.import_merge(b"definitely not a database");
        assert!(matches!(result, Err(DbError::InvalidImport(_))));
    }

    #[test]
    fn test_import_rejects_missing_table() {
        let staging = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(staging.path()).unwrap();
            conn.execute_batch("CREATE TABLE unrelated (x TEXT);").unwrap();
        }
        let blob = std::fs::read(staging.path()).unwrap();

        let db = Database::open_in_memory().unwrap();
        let result = db.import_merge(&blob);
        assert!(matches!(result, Err(DbError::InvalidImport(_))));
    }

    #[test]
    fn test_export_with_copy_survives_bad_dir() {
        let db = Database::open_in_memory().unwrap();
        db.append(&[record("a.eml", &[])]).unwrap();

        // A path that cannot be created; the export itself must still work.
        let blob = db.export_with_copy(Path::new("/dev/null/nope")).unwrap();
        assert!(blob.starts_with(SQLITE_MAGIC));
    }
}
