//! SQLite record sink

use crate::feed::PostRecord;
use crate::output::schema::initialize_schema;
use crate::output::stats::RunStatistics;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed record sink
pub struct SqliteSink {
    conn: Connection,
    run_id: Option<i64>,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(OutputError)` - Failed to open database
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self { conn, run_id: None })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn, run_id: None })
    }

    /// Id of the run in progress
    pub fn run_id(&self) -> Option<i64> {
        self.run_id
    }

    /// Underlying connection, for queries over stored runs
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn active_run(&self) -> OutputResult<i64> {
        self.run_id.ok_or(OutputError::NoActiveRun)
    }
}

impl RecordSink for SqliteSink {
    fn begin_run(&mut self, config_hash: &str) -> OutputResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, 'running')",
            params![now, config_hash],
        )?;
        let run_id = self.conn.last_insert_rowid();
        self.run_id = Some(run_id);
        Ok(run_id)
    }

    fn record_post(&mut self, record: &PostRecord) -> OutputResult<()> {
        let run_id = self.active_run()?;
        let timestamp = record
            .timestamp
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string());

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO posts (run_id, page, author, timestamp, text, link, unavailable, media_kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                record.page,
                record.author,
                timestamp,
                record.text,
                record.link,
                record.unavailable,
                record.media.kind_str(),
            ],
        )?;
        let post_id = tx.last_insert_rowid();

        for (position, body) in record.comments.iter().enumerate() {
            tx.execute(
                "INSERT INTO comments (post_id, position, body) VALUES (?1, ?2, ?3)",
                params![post_id, position as i64, body],
            )?;
        }
        for item in record.media.items() {
            tx.execute(
                "INSERT INTO media (post_id, slot, file_path) VALUES (?1, ?2, ?3)",
                params![
                    post_id,
                    item.slot as i64,
                    item.file_path.to_string_lossy().into_owned()
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn record_failure(&mut self, target: &str, reason: &str) -> OutputResult<()> {
        let run_id = self.active_run()?;
        self.conn.execute(
            "INSERT INTO failures (run_id, target, reason, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, target, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn finish_run(&mut self, stats: &RunStatistics) -> OutputResult<()> {
        let run_id = self.active_run()?;
        let status = if stats.failed_targets() == 0 {
            "completed"
        } else {
            "partial"
        };
        let finished_at = stats
            .finished_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2, records = ?3, failures = ?4 WHERE id = ?5",
            params![
                finished_at,
                status,
                stats.total_records() as i64,
                stats.failed_targets() as i64,
                run_id
            ],
        )?;
        self.run_id = None;
        Ok(())
    }
}
