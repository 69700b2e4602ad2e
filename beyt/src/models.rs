//! Wire models for the poetry API
//!
//! Records are deserialized leniently: a wrong-typed or missing field degrades
//! to an empty/absent value instead of failing the whole response. Only a
//! response without any result array is rejected.

use crate::interface::BeytError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Category shown when the backend leaves it out ("general")
pub const DEFAULT_CATEGORY: &str = "عمومی";

// ─────────────────────────────────────────────────────────────────────────────
// VERSE RECORDS
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a verse inside its couplet, decoded from the `position` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// `0`: first hemistich, partnered with a `Second` at `vorder + 1`
    First,
    /// `1`: second hemistich
    Second,
    /// `-1` (or any value the client does not know): full-width line
    Standalone,
    /// absent/null: neo-poem verse without couplet structure
    Unstructured,
}

impl Position {
    pub fn from_raw(raw: Option<i64>) -> Self {
        match raw {
            None => Position::Unstructured,
            Some(0) => Position::First,
            Some(1) => Position::Second,
            Some(_) => Position::Standalone,
        }
    }
}

/// A sibling verse of the matched verse, as listed in `context_verses`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContextVerse {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::i64_or_zero")]
    pub vorder: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub position: Option<i64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_match: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_liked: bool,
}

impl ContextVerse {
    pub fn position(&self) -> Position {
        Position::from_raw(self.position)
    }
}

/// One search hit as returned by the search endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VerseRecord {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub poem_id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub poet: String,
    #[serde(alias = "title", deserialize_with = "lenient::string")]
    pub poem_title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::i64_or_zero")]
    pub vorder: i64,
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub position: Option<i64>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_liked: bool,
    #[serde(deserialize_with = "lenient::items")]
    pub context_verses: Vec<ContextVerse>,
}

impl VerseRecord {
    pub fn category_or_default(&self) -> String {
        self.category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
    }
}

/// A whole poem from the poem endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoemRecord {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub poet: String,
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::items")]
    pub verses: Vec<ContextVerse>,
}

/// One poet from the poet detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoetRecord {
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(alias = "poet", deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(alias = "bio", deserialize_with = "lenient::string")]
    pub description: String,
    /// Response object re-serialized as JSON
    #[serde(skip)]
    pub raw: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// SEARCH RESPONSE SCHEMAS
// ─────────────────────────────────────────────────────────────────────────────

/// Which backend response shape a page was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    /// `{ verses, total_results?, total?, totalResults? }`
    Verses,
    /// `{ poems, total_results?, total?, totalResults? }`
    LegacyPoems,
}

/// Current search response
#[derive(Debug, Deserialize)]
struct SearchResponseV2 {
    verses: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    total_results: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    total: Option<u64>,
    #[serde(default, rename = "totalResults", deserialize_with = "lenient::opt_u64")]
    total_results_camel: Option<u64>,
}

/// Legacy search response keyed by whole poems
#[derive(Debug, Deserialize)]
struct SearchResponseV1 {
    poems: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    total_results: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    total: Option<u64>,
    #[serde(default, rename = "totalResults", deserialize_with = "lenient::opt_u64")]
    total_results_camel: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VersionedSearchResponse {
    Current(SearchResponseV2),
    Legacy(SearchResponseV1),
}

/// One decoded page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub records: Vec<VerseRecord>,
    /// Total hits reported by the backend, if it reported any
    pub total: Option<u64>,
    pub schema: ResponseSchema,
}

impl SearchPage {
    pub fn new(records: Vec<VerseRecord>, total: Option<u64>) -> Self {
        Self { records, total, schema: ResponseSchema::Verses }
    }
}

impl From<VersionedSearchResponse> for SearchPage {
    fn from(response: VersionedSearchResponse) -> Self {
        match response {
            VersionedSearchResponse::Current(v2) => SearchPage {
                records: decode_records(v2.verses),
                total: v2.total_results.or(v2.total).or(v2.total_results_camel),
                schema: ResponseSchema::Verses,
            },
            VersionedSearchResponse::Legacy(v1) => SearchPage {
                records: decode_records(v1.poems),
                total: v1.total_results.or(v1.total).or(v1.total_results_camel),
                schema: ResponseSchema::LegacyPoems,
            },
        }
    }
}

fn decode_records(values: Vec<Value>) -> Vec<VerseRecord> {
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

/// Decode a search endpoint body
pub fn parse_search_response(body: &str) -> Result<SearchPage, BeytError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BeytError::MalformedResponse(format!("search body is not JSON: {e}")))?;
    let response: VersionedSearchResponse = serde_json::from_value(value).map_err(|_| {
        BeytError::MalformedResponse("expected a `verses` or `poems` array".to_string())
    })?;
    Ok(response.into())
}

/// Decode a poets endpoint body (a plain array of names)
pub fn parse_poets_response(body: &str) -> Result<Vec<String>, BeytError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BeytError::MalformedResponse(format!("poets body is not JSON: {e}")))?;
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        _ => Err(BeytError::MalformedResponse("expected an array of poet names".to_string())),
    }
}

/// Decode a poem endpoint body
pub fn parse_poem_response(body: &str) -> Result<PoemRecord, BeytError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BeytError::MalformedResponse(format!("poem body is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(BeytError::MalformedResponse("expected a poem object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| BeytError::MalformedResponse(e.to_string()))
}

/// Decode a poet detail endpoint body
pub fn parse_poet_response(body: &str) -> Result<PoetRecord, BeytError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BeytError::MalformedResponse(format!("poet body is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(BeytError::MalformedResponse("expected a poet object".to_string()));
    }
    let raw = value.to_string();
    let mut poet: PoetRecord =
        serde_json::from_value(value).map_err(|e| BeytError::MalformedResponse(e.to_string()))?;
    poet.raw = raw;
    Ok(poet)
}

// ─────────────────────────────────────────────────────────────────────────────
// LENIENT FIELD DECODERS
// ─────────────────────────────────────────────────────────────────────────────

mod lenient {
    use super::*;

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(as_i64(&Value::deserialize(d)?))
    }

    pub fn i64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(as_i64(&Value::deserialize(d)?).unwrap_or(0))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(as_i64(&Value::deserialize(d)?).and_then(|n| u64::try_from(n).ok()))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(opt_string(d)?.unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_i64() == Some(1),
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }

    pub fn items<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(values) => values
                .into_iter()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}
