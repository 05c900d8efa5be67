/*!
 * History repository.
 */

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::params;
use uuid::Uuid;

use super::connection::DatabaseConnection;
use super::models::{HistoryRecord, NewHistoryRecord};

/// Raw column values of one history row
struct HistoryRow {
    id: String,
    file_name: String,
    file_hash: String,
    source_language: String,
    target_language: String,
    page_count: u32,
    failed_pages: String,
    output_files: String,
    created_at: String,
}

impl HistoryRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            file_name: row.get(1)?,
            file_hash: row.get(2)?,
            source_language: row.get(3)?,
            target_language: row.get(4)?,
            page_count: row.get(5)?,
            failed_pages: row.get(6)?,
            output_files: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<HistoryRecord> {
        Ok(HistoryRecord {
            failed_pages: serde_json::from_str(&self.failed_pages)
                .with_context(|| format!("Corrupt failed_pages in history entry {}", self.id))?,
            output_files: serde_json::from_str(&self.output_files)
                .with_context(|| format!("Corrupt output_files in history entry {}", self.id))?,
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .with_context(|| format!("Corrupt timestamp in history entry {}", self.id))?
                .with_timezone(&Utc),
            id: self.id,
            file_name: self.file_name,
            file_hash: self.file_hash,
            source_language: self.source_language,
            target_language: self.target_language,
            page_count: self.page_count,
        })
    }
}

/// Append/list/delete access to the history table
#[derive(Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Store a record, assigning it a fresh id and the current time
    pub async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
        let stored = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            file_name: record.file_name,
            file_hash: record.file_hash,
            source_language: record.source_language,
            target_language: record.target_language,
            page_count: record.page_count,
            failed_pages: record.failed_pages,
            output_files: record.output_files,
            created_at: Utc::now(),
        };
        let row = stored.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_history (
                        id, file_name, file_hash, source_language, target_language,
                        page_count, failed_pages, output_files, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        row.id,
                        row.file_name,
                        row.file_hash,
                        row.source_language,
                        row.target_language,
                        row.page_count,
                        serde_json::to_string(&row.failed_pages)?,
                        serde_json::to_string(&row.output_files)?,
                        row.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    ],
                )?;
                Ok(())
            })
            .await?;

        debug!("Recorded history entry {} for {}", stored.id, stored.file_name);
        Ok(stored)
    }

    /// List records by creation time; `None` lists everything
    pub async fn list(&self, limit: Option<usize>, most_recent_first: bool) -> Result<Vec<HistoryRecord>> {
        let order = if most_recent_first { "DESC" } else { "ASC" };
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT id, file_name, file_hash, source_language, target_language,
                           page_count, failed_pages, output_files, created_at
                    FROM translation_history
                    ORDER BY created_at {order}, rowid {order}
                    LIMIT ?1
                    "#
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([limit], HistoryRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                rows.into_iter().map(HistoryRow::into_record).collect()
            })
            .await
    }

    /// Delete a record; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translation_history WHERE id = ?1", [&id])?;
                Ok(deleted > 0)
            })
            .await
    }
}
