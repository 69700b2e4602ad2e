//! Local verse library: liked verses and a verse-details cache
//!
//! Likes are mirrored locally so the UI can show them without a round trip.
//! Cached verse details sit in memory in front of SQLite; a SQLite hit is
//! promoted into memory.

use crate::database::Database;
use crate::interface::{BeytError, DisplayLine, VerseInfo};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(uniffi::Object)]
pub struct Library {
    db: Database,
    memory: Mutex<HashMap<i64, VerseInfo>>,
}

// Internal implementation (not exported via FFI)
impl Library {
    /// Create a library backed by an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, BeytError> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    fn with_database(db: Database) -> Self {
        Self {
            db,
            memory: Mutex::new(HashMap::new()),
        }
    }
}

#[uniffi::export]
impl Library {
    /// Open or create a library at the given database path
    #[uniffi::constructor]
    pub fn new(db_path: String) -> Result<Self, BeytError> {
        let db = Database::open(PathBuf::from(db_path))?;
        Ok(Self::with_database(db))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Liked verses
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true if the verse was not liked before
    pub fn like(&self, verse_id: i64) -> Result<bool, BeytError> {
        Ok(self.db.insert_liked(verse_id)?)
    }

    /// Returns true if the verse was liked before
    pub fn unlike(&self, verse_id: i64) -> Result<bool, BeytError> {
        Ok(self.db.delete_liked(verse_id)?)
    }

    pub fn is_liked(&self, verse_id: i64) -> Result<bool, BeytError> {
        Ok(self.db.is_liked(verse_id)?)
    }

    pub fn liked_ids(&self) -> Result<Vec<i64>, BeytError> {
        Ok(self.db.fetch_liked_ids()?)
    }

    pub fn clear_liked(&self) -> Result<(), BeytError> {
        Ok(self.db.clear_liked()?)
    }

    /// Record every verse the backend marked as liked in rendered lines.
    /// Returns how many were not recorded before. Never removes likes.
    pub fn sync_from_lines(&self, lines: Vec<DisplayLine>) -> Result<u64, BeytError> {
        let mut added = 0;
        for line in &lines {
            for (verse_id, liked) in line.verse_flags() {
                if let (Some(id), true) = (verse_id, liked) {
                    if self.db.insert_liked(id)? {
                        added += 1;
                    }
                }
            }
        }
        if added > 0 {
            debug!(added, "Synced liked verses from rendered lines");
        }
        Ok(added)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verse cache
    // ─────────────────────────────────────────────────────────────────────────

    pub fn cache_verse(&self, info: VerseInfo) -> Result<(), BeytError> {
        self.db.upsert_verse(&info)?;
        self.memory.lock().insert(info.verse_id, info);
        Ok(())
    }

    pub fn cached_verse(&self, verse_id: i64) -> Result<Option<VerseInfo>, BeytError> {
        if let Some(info) = self.memory.lock().get(&verse_id) {
            return Ok(Some(info.clone()));
        }

        let stored = self.db.fetch_verse(verse_id)?;
        if let Some(ref info) = stored {
            self.memory.lock().insert(verse_id, info.clone());
        }
        Ok(stored)
    }

    pub fn forget_verse(&self, verse_id: i64) -> Result<(), BeytError> {
        self.memory.lock().remove(&verse_id);
        Ok(self.db.delete_verse(verse_id)?)
    }

    pub fn clear_verse_cache(&self) -> Result<(), BeytError> {
        self.memory.lock().clear();
        Ok(self.db.clear_verses()?)
    }
}
