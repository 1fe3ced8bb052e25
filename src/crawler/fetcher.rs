//! Page fetching
//!
//! This module turns an article title into its outgoing links:
//! - Building the HTTP client with the configured user agent and timeout
//! - Querying the MediaWiki API, following continuation until every link is collected
//! - Classifying failures as transient (retried) or fatal
//! - Wrapping a page source with retry and pacing

use crate::config::UserAgentConfig;
use crate::crawler::pacer::Pacer;
use crate::crawler::retry::{RetryError, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on continuation requests for a single page
const MAX_CONTINUATIONS: usize = 1000;

/// An article and the titles it links to, in API order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub links: Vec<String>,
}

/// Result of fetching one title through retry and pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page exists; links may be empty
    Found(Page),

    /// The wiki reports the title as missing or invalid
    NotFound,

    /// Every attempt failed with a transient error
    Unreachable { attempts: u32, error: String },
}

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Timeouts and connection failures are worth another attempt; nothing else is
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::Connect(_))
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Anything that can resolve a title to its outgoing links
///
/// `Ok(None)` means the title does not exist.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, title: &str) -> Result<Option<Page>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout, covering connect and body
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use wikigraph::config::UserAgentConfig;
/// use wikigraph::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,

    #[serde(default, rename = "continue")]
    continuation: Option<BTreeMap<String, serde_json::Value>>,

    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    missing: bool,

    #[serde(default)]
    invalid: bool,

    #[serde(default)]
    links: Vec<ApiLink>,
}

#[derive(Debug, Deserialize)]
struct ApiLink {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,

    #[serde(default)]
    info: String,
}

/// Page source backed by the MediaWiki Action API
pub struct WikiApiSource {
    client: Client,
    api_url: Url,
}

impl WikiApiSource {
    pub fn new(client: Client, api_url: Url) -> Self {
        Self { client, api_url }
    }

    fn query_url(&self, title: &str, continuation: &[(String, String)]) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("action", "query")
                .append_pair("format", "json")
                .append_pair("formatversion", "2")
                .append_pair("prop", "links")
                .append_pair("titles", title)
                .append_pair("pllimit", "max");
            for (key, value) in continuation {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn fetch_batch(&self, url: Url) -> Result<ApiResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PageSource for WikiApiSource {
    async fn fetch_page(&self, title: &str) -> Result<Option<Page>, FetchError> {
        let mut links = Vec::new();
        let mut resolved_title = None;
        let mut continuation: Vec<(String, String)> = Vec::new();

        for _ in 0..MAX_CONTINUATIONS {
            let response = self.fetch_batch(self.query_url(title, &continuation)).await?;

            if let Some(error) = response.error {
                return Err(FetchError::Api {
                    code: error.code,
                    info: error.info,
                });
            }

            let page = response
                .query
                .and_then(|q| q.pages.into_iter().next())
                .ok_or_else(|| FetchError::Decode("response contains no page".to_string()))?;

            if page.missing || page.invalid {
                return Ok(None);
            }

            if resolved_title.is_none() {
                resolved_title = page.title;
            }
            links.extend(page.links.into_iter().map(|link| link.title));

            match response.continuation {
                Some(tokens) => {
                    continuation = tokens
                        .into_iter()
                        .map(|(key, value)| match value {
                            serde_json::Value::String(s) => (key, s),
                            other => (key, other.to_string()),
                        })
                        .collect();
                }
                None => {
                    tracing::debug!("Fetched {} links for '{}'", links.len(), title);
                    return Ok(Some(Page {
                        title: resolved_title.unwrap_or_else(|| title.to_string()),
                        links,
                    }));
                }
            }
        }

        Err(FetchError::Decode(format!(
            "continuation did not terminate after {} requests",
            MAX_CONTINUATIONS
        )))
    }
}

/// A page source wrapped in retry and pacing
pub struct PageFetcher {
    source: Box<dyn PageSource>,
    retry: RetryPolicy,
    pacer: Pacer,
}

impl PageFetcher {
    pub fn new(source: Box<dyn PageSource>, retry: RetryPolicy, pacer: Pacer) -> Self {
        tracing::debug!(
            "Page fetcher: {} attempts per title, {:?} between retries, {:?} between requests",
            retry.max_attempts(),
            retry.delay(),
            pacer.delay()
        );
        Self {
            source,
            retry,
            pacer,
        }
    }

    /// Fetches a title, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(FetchOutcome)` - Found, absent, or unreachable after all attempts
    /// * `Err(FetchError)` - A non-transient failure; the crawl cannot continue
    pub async fn fetch(&self, title: &str) -> Result<FetchOutcome, FetchError> {
        let source = self.source.as_ref();
        let pacer = &self.pacer;

        let result = self
            .retry
            .run(
                |attempt| async move {
                    let pending = pacer.time_until_next_request();
                    if !pending.is_zero() {
                        tracing::trace!(
                            "Waiting {:?} before attempt {} for '{}'",
                            pending,
                            attempt,
                            title
                        );
                    }
                    pacer.wait().await;
                    source.fetch_page(title).await
                },
                FetchError::is_transient,
            )
            .await;

        match result {
            Ok(Some(page)) => Ok(FetchOutcome::Found(page)),
            Ok(None) => Ok(FetchOutcome::NotFound),
            Err(RetryError::Exhausted { attempts, last }) => {
                tracing::warn!(
                    "Giving up on '{}' after {} attempts: {}",
                    title,
                    attempts,
                    last
                );
                Ok(FetchOutcome::Unreachable {
                    attempts,
                    error: last.to_string(),
                })
            }
            Err(RetryError::Fatal(e)) => Err(e),
        }
    }
}
