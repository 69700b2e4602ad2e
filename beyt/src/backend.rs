//! Poetry API access
//!
//! `SearchBackend` is the seam between the search session and the network.
//! `HttpBackend` talks to the real REST API; tests substitute their own.
//! Calls fail fast: no retries, no backoff.

use crate::config::ClientConfig;
use crate::interface::BeytError;
use crate::models::{
    parse_poem_response, parse_poet_response, parse_poets_response, parse_search_response,
    PoemRecord, PoetRecord, SearchPage,
};
use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

/// One page request against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub poet_names: Vec<String>,
    pub liked_only: bool,
    /// 1-based backend page
    pub page: u32,
    pub limit: u32,
}

impl SearchRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetch one page of search hits
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, BeytError>;

    /// Fetch every poet name, in the backend's order
    async fn poets(&self) -> Result<Vec<String>, BeytError>;

    /// Fetch one poet's detail page
    async fn poet(&self, poet_id: u64) -> Result<PoetRecord, BeytError>;

    /// Fetch one whole poem
    async fn poem(&self, poem_id: i64) -> Result<PoemRecord, BeytError>;
}

/// REST client for the poetry API
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BeytError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BeytError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_text(&self, url: Url) -> Result<String, BeytError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "API request failed");
            return Err(BeytError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, BeytError> {
        let body = self.get_text(search_url(&self.base_url, request)?).await?;
        parse_search_response(&body)
    }

    async fn poets(&self) -> Result<Vec<String>, BeytError> {
        let body = self.get_text(endpoint(&self.base_url, &["poets"])?).await?;
        parse_poets_response(&body)
    }

    async fn poet(&self, poet_id: u64) -> Result<PoetRecord, BeytError> {
        let id = poet_id.to_string();
        let body = self.get_text(endpoint(&self.base_url, &["poets", &id])?).await?;
        parse_poet_response(&body)
    }

    async fn poem(&self, poem_id: i64) -> Result<PoemRecord, BeytError> {
        let id = poem_id.to_string();
        let body = self.get_text(endpoint(&self.base_url, &["poem", &id])?).await?;
        parse_poem_response(&body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// URL BUILDING
// ─────────────────────────────────────────────────────────────────────────────

/// Parse the API base, making sure relative joins keep its path
pub fn parse_base_url(raw: &str) -> Result<Url, BeytError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| BeytError::InvalidInput(format!("invalid base URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(BeytError::InvalidInput(format!("base URL {raw:?} cannot be a base")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, BeytError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BeytError::InvalidInput(format!("base URL {base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `GET /search?q=..&poet=a,b&liked_only=true&limit=..&offset=..`
///
/// `q` and `poet` are left out when empty, `liked_only` when false.
pub fn search_url(base: &Url, request: &SearchRequest) -> Result<Url, BeytError> {
    let mut url = endpoint(base, &["search"])?;
    {
        let mut query = url.query_pairs_mut();
        if !request.query.trim().is_empty() {
            query.append_pair("q", request.query.trim());
        }
        if !request.poet_names.is_empty() {
            query.append_pair("poet", &request.poet_names.join(","));
        }
        if request.liked_only {
            query.append_pair("liked_only", "true");
        }
        query.append_pair("limit", &request.limit.to_string());
        query.append_pair("offset", &request.offset().to_string());
    }
    Ok(url)
}
