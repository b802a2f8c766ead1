//! Content API client
//!
//! Resolves a content ref, pages through document searches and fetches single
//! documents by id. Requests are optionally throttled with a `governor` rate
//! limiter.

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::types::{ApiRoot, QueryPage, RawDocument};
use crate::config::SourceOptions;
use crate::normalize::DocumentSource;

const USER_AGENT: &str = concat!("prismic-source/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Documents requested per search page (the API maximum)
pub const PAGE_SIZE: u32 = 100;

/// Content API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No master ref advertised by {0}")]
    MissingMasterRef(String),
}

impl From<ApiError> for crate::Error {
    fn from(e: ApiError) -> Self {
        crate::Error::Fetch(e.to_string())
    }
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Connection settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub lang: String,
    pub fetch_links: Vec<String>,
    pub requests_per_second: Option<u32>,
}

impl From<&SourceOptions> for ClientOptions {
    fn from(options: &SourceOptions) -> Self {
        Self {
            endpoint: options.endpoint(),
            access_token: options.access_token.clone(),
            lang: options.lang.clone(),
            fetch_links: options.fetch_links.clone(),
            requests_per_second: options.requests_per_second,
        }
    }
}

/// Content API client
pub struct PrismicClient {
    http_client: reqwest::Client,
    options: ClientOptions,
    reference: OnceCell<String>,
    rate_limiter: Option<DirectLimiter>,
}

impl PrismicClient {
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let rate_limiter = options
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            http_client,
            options: ClientOptions {
                endpoint: options.endpoint.trim_end_matches('/').to_string(),
                ..options
            },
            reference: OnceCell::new(),
            rate_limiter,
        })
    }

    pub fn from_options(options: &SourceOptions) -> Result<Self, ApiError> {
        Self::new(ClientOptions::from(options))
    }

    /// Query an explicit ref (e.g. a preview token) instead of the master ref
    pub fn with_ref(self, reference: impl Into<String>) -> Self {
        Self {
            reference: OnceCell::new_with(Some(reference.into())),
            ..self
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let mut request = self.http_client.get(url).query(query);
        if let Some(token) = &self.options.access_token {
            request = request.query(&[("access_token", token)]);
        }

        debug!(url = %url, "Querying content API");

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// The master ref advertised by the API root
    pub async fn master_ref(&self) -> Result<String, ApiError> {
        let root: ApiRoot = self.get_json(&self.options.endpoint, &[]).await?;
        root.master_ref()
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingMasterRef(self.options.endpoint.clone()))
    }

    /// Ref used for every search; resolved once per client
    pub async fn content_ref(&self) -> Result<&str, ApiError> {
        self.reference
            .get_or_try_init(|| self.master_ref())
            .await
            .map(String::as_str)
    }

    fn search_url(&self) -> String {
        format!("{}/documents/search", self.options.endpoint)
    }

    fn search_query(&self, reference: &str, page: u32, predicate: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("ref", reference.to_string()),
            ("page", page.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("lang", self.options.lang.clone()),
        ];
        if !self.options.fetch_links.is_empty() {
            query.push(("fetchLinks", self.options.fetch_links.join(",")));
        }
        if let Some(predicate) = predicate {
            query.push(("q", predicate.to_string()));
        }
        query
    }

    /// One page of the unfiltered document search
    pub async fn query_page(&self, page: u32) -> Result<QueryPage, ApiError> {
        let reference = self.content_ref().await?;
        let query = self.search_query(reference, page, None);
        self.get_json(&self.search_url(), &query).await
    }

    /// Every document, paging until the reported total is reached
    ///
    /// Any page failure aborts the whole query.
    pub async fn query_all(&self) -> Result<Vec<RawDocument>, ApiError> {
        let mut documents = Vec::new();
        let mut page = 1;

        loop {
            let result = self.query_page(page).await?;
            let received = result.results.len();
            let total = result.total_results_size;
            documents.extend(result.results);

            debug!(page, received, total, "Fetched document page");

            if received == 0 || page.saturating_mul(PAGE_SIZE) >= total {
                break;
            }
            page += 1;
        }

        info!(count = documents.len(), "Fetched all documents");
        Ok(documents)
    }

    /// Single document by content API id
    pub async fn get_by_id(&self, id: &str) -> Result<Option<RawDocument>, ApiError> {
        let reference = self.content_ref().await?;
        let predicate = format!("[[at(document.id,\"{}\")]]", id);
        let query = self.search_query(reference, 1, Some(&predicate));
        let page: QueryPage = self.get_json(&self.search_url(), &query).await?;
        Ok(page.results.into_iter().next())
    }
}

#[async_trait]
impl DocumentSource for PrismicClient {
    async fn get_by_id(&self, id: &str) -> crate::Result<Option<RawDocument>> {
        Ok(PrismicClient::get_by_id(self, id).await?)
    }
}
