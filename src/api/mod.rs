use crate::config::ApiConfig;
use crate::internal::models::{
    ArticleDetail, ArticlePage, CategoryList, CollectionSummary, HistoricalSummary,
    SchedulerStatus, SourceList, Stats, TodayArticles,
};
use crate::internal::query::Query;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";

/// Environment variable that overrides the configured base URL.
pub const API_URL_ENV: &str = "NEWS_API_URL";

/// Structured error body returned by the backend: `{ error, message?, docs? }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceError {
    #[serde(skip)]
    pub status: Option<u16>,
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub docs: Option<String>,
}

impl ServiceError {
    /// The primary message followed by the non-empty elaboration and docs
    /// fields, separated by blank lines.
    pub fn full_text(&self) -> String {
        [Some(&self.error), self.message.as_ref(), self.docs.as_ref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network or HTTP-layer failure without a structured body.
    #[error("{context}: {reason}")]
    Transport { context: String, reason: String },
    /// Backend reported `{ error, message?, docs? }`.
    #[error("{0}")]
    Service(ServiceError),
    #[error("article {0} not found")]
    NotFound(u32),
}

impl ApiError {
    fn transport(context: &str, reason: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

/// HTTP client for the news collection backend.
///
/// Every call fails fast; nothing is retried.
#[derive(Clone)]
pub struct ApiService {
    client: Client,
    base_url: String,
    historical_timeout: Duration,
    enable_metrics: bool,
}

impl ApiService {
    pub fn new(config: &ApiConfig, enable_metrics: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: normalize_base_url(&config.resolved_base_url()),
            historical_timeout: Duration::from_secs(config.historical_timeout_secs),
            enable_metrics,
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self {
            client: Client::new(),
            base_url: normalize_base_url(&config.base_url),
            historical_timeout: Duration::from_secs(config.historical_timeout_secs),
            enable_metrics: false,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the raw status and body.
    async fn fetch(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(context, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(context, e))?;

        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), %status, context, "api.request");
        }
        Ok((status, body.to_vec()))
    }

    async fn send_json<T>(&self, request: RequestBuilder, context: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.fetch(request, context).await?;
        decode(context, status, &body)
    }

    #[tracing::instrument(skip(self, query), fields(query = %query))]
    pub async fn list_articles(&self, query: &Query) -> Result<ArticlePage, ApiError> {
        let request = self
            .client
            .get(self.url("/articles/"))
            .query(&query.to_params());
        self.send_json(request, "list_articles").await
    }

    pub async fn get_article(&self, id: u32) -> Result<ArticleDetail, ApiError> {
        let request = self.client.get(self.url(&format!("/articles/{}", id)));
        let (status, body) = self.fetch(request, "get_article").await?;
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id));
        }
        decode("get_article", status, &body)
    }

    pub async fn list_today_articles(&self) -> Result<TodayArticles, ApiError> {
        let request = self.client.get(self.url("/articles/today"));
        self.send_json(request, "list_today_articles").await
    }

    pub async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        let request = self.client.get(self.url("/articles/categories"));
        let list: CategoryList = self.send_json(request, "list_categories").await?;
        Ok(list.categories)
    }

    pub async fn list_sources(&self) -> Result<Vec<String>, ApiError> {
        let request = self.client.get(self.url("/sources/"));
        let list: SourceList = self.send_json(request, "list_sources").await?;
        Ok(list.sources)
    }

    pub async fn get_stats(&self) -> Result<Stats, ApiError> {
        let request = self.client.get(self.url("/articles/stats"));
        self.send_json(request, "get_stats").await
    }

    pub async fn scheduler_status(&self) -> Result<SchedulerStatus, ApiError> {
        let request = self.client.get(self.url("/scheduler/status"));
        self.send_json(request, "scheduler_status").await
    }

    /// Run one collection pass on the backend and wait for it to finish.
    pub async fn trigger_collection(&self) -> Result<CollectionSummary, ApiError> {
        tracing::info!("Triggering immediate collection");
        let request = self.client.post(self.url("/scheduler/collect"));
        self.send_json(request, "trigger_collection").await
    }

    /// Collect the past 7 days. Typically takes 30-60 seconds, so this call
    /// carries its own, longer timeout.
    pub async fn trigger_historical_collection(&self) -> Result<HistoricalSummary, ApiError> {
        tracing::info!("Triggering historical collection");
        let request = self
            .client
            .post(self.url("/scheduler/collect-historical"))
            .timeout(self.historical_timeout);
        self.send_json(request, "trigger_historical_collection").await
    }
}

impl Default for ApiService {
    fn default() -> Self {
        Self::new(&ApiConfig::default(), false)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Map a response onto `T` or the `ApiError` taxonomy. A 2xx body that does
/// not decode as `T` but carries `{ error, ... }` is still a service error.
fn decode<T>(context: &str, status: StatusCode, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    if status.is_success()
        && let Ok(value) = serde_json::from_slice::<T>(body)
    {
        return Ok(value);
    }

    match serde_json::from_slice::<ServiceError>(body) {
        Ok(mut service) => {
            service.status = Some(status.as_u16());
            Err(ApiError::Service(service))
        }
        Err(_) if !status.is_success() => {
            Err(ApiError::transport(context, format!("HTTP {}", status)))
        }
        Err(e) => Err(ApiError::transport(
            context,
            format!("malformed response body: {}", e),
        )),
    }
}
