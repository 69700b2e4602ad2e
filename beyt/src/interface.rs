//! Beyt FFI Interface Definition
//!
//! This file defines the public interface exposed to the host UI via UniFFI.
//! It acts as the source of truth for shared types.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// One rendered line of a poem excerpt
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum DisplayLine {
    /// Two hemistichs shown side by side, tagged by the first hemistich's vorder
    Couplet {
        vorder: i64,
        first: Hemistich,
        second: Hemistich,
    },
    /// A standalone verse spanning the whole line
    FullWidth {
        vorder: i64,
        text: String,
        verse_id: Option<i64>,
        liked: bool,
    },
}

impl DisplayLine {
    pub fn vorder(&self) -> i64 {
        match self {
            DisplayLine::Couplet { vorder, .. } => *vorder,
            DisplayLine::FullWidth { vorder, .. } => *vorder,
        }
    }

    /// Texts of the line: both halves for a couplet, one entry otherwise
    pub fn texts(&self) -> Vec<&str> {
        match self {
            DisplayLine::Couplet { first, second, .. } => vec![first.text.as_str(), second.text.as_str()],
            DisplayLine::FullWidth { text, .. } => vec![text.as_str()],
        }
    }

    /// (verse id, liked) pairs for every verse shown on this line
    pub fn verse_flags(&self) -> Vec<(Option<i64>, bool)> {
        match self {
            DisplayLine::Couplet { first, second, .. } => {
                vec![(first.verse_id, first.liked), (second.verse_id, second.liked)]
            }
            DisplayLine::FullWidth { verse_id, liked, .. } => vec![(*verse_id, *liked)],
        }
    }
}

/// Result of a `load_more` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LoadOutcome {
    /// The next backend page was fetched and `count` excerpts were appended
    Appended { count: u64 },
    /// Another fetch for this search is still in flight; nothing was requested
    AlreadyLoading,
    /// Every result the backend reported is already loaded
    Exhausted,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Half of a couplet
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct Hemistich {
    pub text: String,
    pub verse_id: Option<i64>,
    pub liked: bool,
}

/// Display-ready search hit: up to three lines of the poem around the matched verse
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SearchExcerpt {
    /// Poem-level id used for navigation (distinct from `verse_id`)
    pub poem_id: Option<i64>,
    pub verse_id: Option<i64>,
    /// Session-local poet id, present once the poet directory is loaded
    pub poet_id: Option<u64>,
    pub poet_name: String,
    pub poem_title: String,
    pub display_lines: Vec<DisplayLine>,
    pub matched_verse_text: String,
    pub url: String,
    pub category: String,
    /// Whether the whole poem renders to more lines than the preview shows
    pub has_more: bool,
}

/// Read-only view of a search session
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct SessionSnapshot {
    pub query: String,
    pub poet_names: Vec<String>,
    pub liked_only: bool,
    pub loaded_count: u64,
    pub total_count: u64,
    pub backend_page: u32,
    pub cursor: u64,
    pub is_fetching_more: bool,
}

/// A poet as shown in filter pickers; ids are positional and session-local
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PoetEntry {
    pub id: u64,
    pub name: String,
}

/// Poet detail page data
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PoetDetails {
    pub poet_id: u64,
    pub name: String,
    pub description: String,
    /// The whole response object, for fields the client does not model
    pub details_json: String,
}

/// Every line of one poem
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FullPoem {
    pub poem_id: Option<i64>,
    pub title: String,
    pub poet_name: String,
    pub url: String,
    pub category: String,
    pub lines: Vec<DisplayLine>,
}

/// Cached verse details (used when a verse is referenced outside its poem)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, uniffi::Record)]
pub struct VerseInfo {
    pub verse_id: i64,
    pub text: String,
    pub poet_name: String,
    pub poem_title: String,
    pub poem_id: Option<i64>,
}

/// Solar Hijri calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Error type for Beyt operations
#[derive(Debug, Error, uniffi::Error)]
pub enum BeytError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Superseded by a newer search")]
    Superseded,
    #[error("Operation cancelled")]
    Cancelled,
}

impl BeytError {
    /// HTTP status attached to the error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BeytError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<crate::database::DatabaseError> for BeytError {
    fn from(e: crate::database::DatabaseError) -> Self {
        BeytError::DatabaseError(e.to_string())
    }
}

impl From<reqwest::Error> for BeytError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => BeytError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => BeytError::Network(e.to_string()),
        }
    }
}
