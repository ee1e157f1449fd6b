//! HTTP request executor
//!
//! Sends exactly one GET per call and classifies what came back:
//! - 2xx with the `{ data, meta }` envelope -> `Success`
//! - 429 -> `RateLimited` (with `Retry-After` if present)
//! - timeout / connection failure -> `Transient`
//! - any other 4xx/5xx -> `Fatal`
//!
//! Retrying is not this module's job; see [`crate::pagination::Paginator`].

use super::backoff::RetrySignal;
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{RawGameRecord, StringMap};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Maximum number of characters of an error body kept for diagnostics
pub const BODY_EXCERPT_CHARS: usize = 500;

/// One GET request: endpoint, headers, query parameters and timeout.
///
/// The paginator rewrites the page parameter between calls; everything else
/// stays fixed for one logical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Endpoint URL
    pub endpoint: String,
    /// Request headers
    pub headers: StringMap,
    /// Query parameters
    pub query: StringMap,
    /// Per-request timeout
    pub timeout: Duration,
}

impl FetchRequest {
    /// Create a request with the default 30s timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: StringMap::new(),
            query: StringMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set or replace a query parameter in place
    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        self.query.insert(key.to_string(), value.into());
    }

    /// Remove a query parameter in place
    pub fn remove_param(&mut self, key: &str) {
        self.query.remove(key);
    }
}

/// Pagination block of the response envelope.
///
/// Both fields are kept as raw JSON: API versions disagree on whether the
/// cursor is a string or an integer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageMeta {
    /// Cursor for the next page (cursor pagination)
    #[serde(default)]
    pub next_cursor: Option<Value>,
    /// Number of the next page (page-number pagination)
    #[serde(default)]
    pub next_page: Option<Value>,
}

impl PageMeta {
    /// Meta pointing at a next cursor
    pub fn cursor(cursor: impl Into<Value>) -> Self {
        Self {
            next_cursor: Some(cursor.into()),
            next_page: None,
        }
    }

    /// Meta pointing at a next page
    pub fn page(page: u32) -> Self {
        Self {
            next_cursor: None,
            next_page: Some(Value::from(page)),
        }
    }

    /// Meta for the last page
    pub fn last() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<RawGameRecord>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

/// Classified result of one request; exactly one variant per call
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// 2xx with a decoded envelope
    Success {
        /// Records of this page, in response order
        records: Vec<RawGameRecord>,
        /// Pagination block
        meta: PageMeta,
    },
    /// HTTP 429
    RateLimited {
        /// Parsed `Retry-After`
        retry_after: Option<Duration>,
    },
    /// Timeout, connection refused/reset, interrupted body
    Transient {
        /// Underlying cause
        cause: String,
    },
    /// Any other 4xx/5xx
    Fatal {
        /// Status code
        status: u16,
        /// Response body, truncated to [`BODY_EXCERPT_CHARS`]
        body: String,
    },
}

impl ResponseOutcome {
    /// Build a success outcome
    pub fn success(records: Vec<RawGameRecord>, meta: PageMeta) -> Self {
        Self::Success { records, meta }
    }

    /// Build a transient outcome
    pub fn transient(cause: impl Into<String>) -> Self {
        Self::Transient {
            cause: cause.into(),
        }
    }

    /// Build a fatal outcome, truncating the body
    pub fn fatal(status: u16, body: &str) -> Self {
        Self::Fatal {
            status,
            body: excerpt(body),
        }
    }

    /// Retry signal for non-success outcomes
    pub fn retry_signal(&self) -> Option<RetrySignal> {
        match self {
            Self::Success { .. } => None,
            Self::RateLimited { retry_after } => Some(RetrySignal::RateLimited {
                retry_after: *retry_after,
            }),
            Self::Transient { .. } => Some(RetrySignal::Transient),
            Self::Fatal { .. } => Some(RetrySignal::Fatal),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Anything that can turn a [`FetchRequest`] into a [`ResponseOutcome`].
///
/// Implementations must not return `Err` for HTTP-level conditions; `Err` is
/// reserved for requests that could never succeed (malformed URL, bad header)
/// and for 2xx bodies that are not the expected envelope.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute one request
    async fn execute(&self, request: &FetchRequest) -> Result<ResponseOutcome>;
}

/// Configuration for the HTTP executor
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Optional client-side pacing
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("hoops-ingest/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: None,
        }
    }
}

impl HttpClientConfig {
    /// Set the pacer
    #[must_use]
    pub fn with_rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }
}

/// reqwest-backed [`Executor`]
pub struct HttpExecutor {
    client: Client,
    rate_limiter: Option<RateLimiter>,
}

impl HttpExecutor {
    /// Create an executor with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create an executor with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Check if client-side pacing is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, request: &FetchRequest) -> Result<ResponseOutcome> {
        let url = Url::parse(&request.endpoint)?;

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(Error::Http(e)),
            Err(e) => return Ok(classify_send_error(&e)),
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(ResponseOutcome::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(ResponseOutcome::fatal(status.as_u16(), &body));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Ok(classify_send_error(&e)),
        };

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            Error::decode(format!(
                "unexpected response body from {}: {e}: {}",
                request.endpoint,
                excerpt(&body)
            ))
        })?;

        debug!(
            "GET {} -> {} ({} records)",
            request.endpoint,
            status.as_u16(),
            envelope.data.len()
        );

        Ok(ResponseOutcome::success(
            envelope.data,
            envelope.meta.unwrap_or_default(),
        ))
    }
}

fn classify_send_error(e: &reqwest::Error) -> ResponseOutcome {
    if e.is_timeout() {
        ResponseOutcome::transient(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ResponseOutcome::transient(format!("connection failed: {e}"))
    } else {
        ResponseOutcome::transient(e.to_string())
    }
}

/// Parse `Retry-After` as (possibly fractional) seconds.
///
/// Values a `Duration` cannot hold count as absent.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// First [`BODY_EXCERPT_CHARS`] characters of a body
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
