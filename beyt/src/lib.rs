//! Beyt - client core for a Persian poetry search service
//!
//! Turns raw search hits into display-ready excerpts and keeps the paginated
//! result list for the host UI, exported through UniFFI.
//!
//! # Architecture
//! - `transform`: Verse reconstruction (context window, couplets, legacy text)
//! - `session`: Result aggregation and pagination (`SearchSession`)
//! - `backend`: REST access behind the `SearchBackend` trait
//! - `models`: Wire models and versioned response schemas
//! - `library`: Liked verses and verse cache on SQLite (`Library`)
//! - `lookup`, `jalali`: Dictionary links and Persian calendar dates

pub mod backend;
pub mod config;
mod database;
mod interface;
mod jalali;
mod library;
mod lookup;
pub mod models;
pub mod poets;
mod session;
pub mod transform;

pub use backend::{HttpBackend, SearchBackend, SearchRequest};
pub use config::ClientConfig;
pub use interface::*;
pub use jalali::{format_persian_date, format_persian_date_with_month, to_jalali, MISSING_DATE};
pub use library::Library;
pub use lookup::{dictionary_url, extract_lookup_word};
pub use session::{SearchSession, PAGE_SIZE};
pub use transform::build_excerpt;

uniffi::setup_scaffolding!("beyt");
