//! SQLite persistence for analysis records.
//!
//! One `records` table holds the full serialized [`AnalysisRecord`] as a
//! JSON blob alongside a few indexed columns. The dashboard reads through
//! [`RecordRepository::latest`]; nothing here writes back into the pipeline.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use uuid::Uuid;

use callscore_record::{AnalysisRecord, RecordRepository};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        tracing::debug!(path = %path.display(), "opened record store");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    // Idempotent: safe to run on every open.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                record_id TEXT PRIMARY KEY,
                call_id TEXT NOT NULL,
                provider_used TEXT NOT NULL,
                created_at TEXT NOT NULL,
                composite_score REAL NOT NULL,
                record_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at);
            CREATE INDEX IF NOT EXISTS idx_records_call_id ON records(call_id);
            "#,
        )?;
        Ok(())
    }
}

impl RecordRepository for Database {
    type Error = StorageError;

    /// Upserts on `record_id`: reprocessing a call replaces its previous
    /// record instead of accumulating duplicates.
    fn save(&self, record: &AnalysisRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO records (record_id, call_id, provider_used, created_at, composite_score, record_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                record.record_id.to_string(),
                &record.call_id,
                &record.provider_used,
                record.created_at.to_rfc3339(),
                record.composite_score,
                json,
            ),
        )?;
        tracing::debug!(call_id = %record.call_id, "saved analysis record");
        Ok(())
    }

    fn get(&self, record_id: &Uuid) -> Result<AnalysisRecord> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let json: String = conn
            .query_row(
                "SELECT record_json FROM records WHERE record_id = ?1",
                [record_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::NotFound(format!("record {record_id}"))
                }
                other => StorageError::Database(other),
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Newest first, ties broken by call id so paging is stable.
    fn latest(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT record_json FROM records ORDER BY created_at DESC, call_id ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            let json = row?;
            records.push(serde_json::from_str(&json)?);
        }
        Ok(records)
    }

    fn delete(&self, record_id: &Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let affected = conn.execute(
            "DELETE FROM records WHERE record_id = ?1",
            [record_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("record {record_id}")));
        }
        Ok(())
    }
}
