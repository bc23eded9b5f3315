//! Record CRUD operations with duplicate filtering.

use crate::database::Database;
use crate::dedup::DedupIndex;
use crate::error::{DbError, DbResult};
use curator_core::{NewRecord, StoredRecord};
use rusqlite::params;
use std::collections::HashSet;
use tracing::debug;

/// Result of an append call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// Decode a JSON-encoded string array column, substituting an empty list
/// on any decode failure.
pub(crate) fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

pub(crate) fn encode_list(items: &[String]) -> DbResult<String> {
    serde_json::to_string(items).map_err(DbError::from)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id: i64 = row.get(0)?;
    let tags_json: String = row.get(4)?;
    let urls_json: String = row.get(6)?;

    Ok(StoredRecord {
        id: id.to_string(),
        source_name: row.get(1)?,
        sent_at: row.get(2)?,
        topic: row.get(3)?,
        tags: decode_list(&tags_json),
        summary_html: row.get(5)?,
        urls: decode_list(&urls_json),
    })
}

impl Database {
    /// Rebuild the duplicate index from the current store contents.
    pub fn load_dedup_index(&self) -> DbResult<DedupIndex> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT fileName, urls FROM records")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let urls_json: String = row.get(1)?;
            Ok((name, urls_json))
        })?;

        let mut index = DedupIndex::new();
        for row in rows {
            let (name, urls_json) = row?;
            index.insert(&name, &decode_list(&urls_json));
        }
        Ok(index)
    }

    /// File names of every stored record, for batch pre-filtering.
    pub fn file_names(&self) -> DbResult<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT fileName FROM records")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<HashSet<_>, _>>().map_err(DbError::from)
    }

    /// Insert records that are not duplicates, in a single transaction.
    ///
    /// Duplicates (by normalized-URL intersection first, file name second)
    /// are skipped silently. The index is updated as records go in, so
    /// records later in the slice are checked against earlier ones too.
    pub fn append(&self, records: &[NewRecord]) -> DbResult<AppendOutcome> {
        let mut index = self.load_dedup_index()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut outcome = AppendOutcome::default();

        for record in records {
            if let Some(reason) = index.duplicate_reason(record) {
                debug!(
                    source = %record.source_name,
                    reason = ?reason,
                    "Skipping duplicate record"
                );
                outcome.skipped += 1;
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
            outcome.inserted += 1;
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// Full scan, most recently inserted first.
    pub fn get_all(&self) -> DbResult<Vec<StoredRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, fileName, fechaEnvio, tematica, etiquetas, contenido, urls
             FROM records ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete records in one transaction; any failure rolls the whole
    /// call back.
    pub fn delete_by_ids(&self, ids: &[String]) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;

        for id in ids {
            let id: i64 = id
                .parse()
                .map_err(|_| DbError::Other(format!("Invalid record id: {id}")))?;
            deleted += tx.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(deleted)
    }

    pub fn count(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count)
    }
}
