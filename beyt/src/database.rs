//! SQLite database layer for the local verse library
//!
//! Two tables: the set of verses the user liked, and cached verse details
//! (stored as JSON so the cached shape can grow without migrations).

use crate::interface::VerseInfo;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Thread-safe database wrapper
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.setup_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.setup_schema()?;
        Ok(db)
    }

    /// Set up the database schema
    fn setup_schema(&self) -> DatabaseResult<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS liked_verses (
                verseId INTEGER PRIMARY KEY,
                likedAt DATETIME NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS verse_cache (
                verseId INTEGER PRIMARY KEY,
                payload TEXT NOT NULL,
                cachedAt DATETIME NOT NULL
            )
            "#,
            [],
        )?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // LIKED VERSES
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a like. Returns false if the verse was already liked.
    pub fn insert_liked(&self, verse_id: i64) -> DatabaseResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO liked_verses (verseId, likedAt) VALUES (?1, ?2)",
            params![verse_id, format_timestamp(Utc::now())],
        )?;
        Ok(changed > 0)
    }

    /// Remove a like. Returns false if the verse was not liked.
    pub fn delete_liked(&self, verse_id: i64) -> DatabaseResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM liked_verses WHERE verseId = ?1", [verse_id])?;
        Ok(changed > 0)
    }

    pub fn is_liked(&self, verse_id: i64) -> DatabaseResult<bool> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .query_row(
                "SELECT verseId FROM liked_verses WHERE verseId = ?1",
                [verse_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All liked verse ids, most recent first
    pub fn fetch_liked_ids(&self) -> DatabaseResult<Vec<i64>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT verseId FROM liked_verses ORDER BY likedAt DESC, verseId DESC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    pub fn clear_liked(&self) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM liked_verses", [])?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // VERSE CACHE
    // ─────────────────────────────────────────────────────────────────────────

    pub fn upsert_verse(&self, info: &VerseInfo) -> DatabaseResult<()> {
        let payload = serde_json::to_string(info)?;
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO verse_cache (verseId, payload, cachedAt) VALUES (?1, ?2, ?3)
            ON CONFLICT(verseId) DO UPDATE SET payload = excluded.payload, cachedAt = excluded.cachedAt
            "#,
            params![info.verse_id, payload, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }

    pub fn fetch_verse(&self, verse_id: i64) -> DatabaseResult<Option<VerseInfo>> {
        let payload: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT payload FROM verse_cache WHERE verseId = ?1",
                [verse_id],
                |row| row.get(0),
            )
            .optional()?
        };

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn delete_verse(&self, verse_id: i64) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM verse_cache WHERE verseId = ?1", [verse_id])?;
        Ok(())
    }

    pub fn clear_verses(&self) -> DatabaseResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM verse_cache", [])?;
        Ok(())
    }
}
