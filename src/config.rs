//! Configuration for an ingestion run
//!
//! Everything here is built once at process start and passed down
//! explicitly: the credential, the API version (which fixes the pagination
//! strategy), client tuning, and the logical units to fetch.

use crate::error::{Error, Result};
use crate::http::{BackoffPolicy, FetchRequest, HttpClientConfig, RateLimiterConfig};
use crate::pagination::{CursorStrategy, PageNumberStrategy, PaginationStrategy, PaginatorConfig};
use crate::types::LogicalUnit;
use chrono::{Duration as DateSpan, NaiveDate};
use std::fmt;
use std::time::Duration;

// ============================================================================
// Environment Variables
// ============================================================================

/// API key for the games API
pub const API_KEY_ENV: &str = "BALLDONTLIE_API_KEY";

/// Comma-separated seasons to ingest
pub const SEASONS_ENV: &str = "SEASONS";

/// Days back from today to ingest (date-range mode)
pub const DAYS_BACK_ENV: &str = "DAYS_BACK";

/// Largest accepted `DAYS_BACK` (ten years of days)
pub const MAX_DAYS_BACK: u32 = 3660;

/// Default API host
pub const DEFAULT_API_BASE_URL: &str = "https://api.balldontlie.io";

// ============================================================================
// Credential
// ============================================================================

/// API credential, sent verbatim in the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key; blank keys are rejected
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(Error::missing_field(API_KEY_ENV));
        }
        Ok(Self(key))
    }

    /// Read [`API_KEY_ENV`] from the process environment
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| Error::missing_field(API_KEY_ENV))?;
        Self::new(key)
    }

    /// Header value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// ============================================================================
// API Version
// ============================================================================

/// Games API version; each paginates differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ApiVersion {
    /// `/v1/games`, cursor pagination
    #[value(name = "v1")]
    V1,
    /// `/nba/v1/games`, page-number pagination
    #[value(name = "nba-v1")]
    NbaV1,
}

impl ApiVersion {
    /// Path of the games endpoint
    pub fn games_path(self) -> &'static str {
        match self {
            Self::V1 => "/v1/games",
            Self::NbaV1 => "/nba/v1/games",
        }
    }

    /// Full games endpoint under `base_url`
    pub fn games_endpoint(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.games_path())
    }

    /// Pagination strategy of this version
    pub fn strategy(self) -> Box<dyn PaginationStrategy> {
        match self {
            Self::V1 => Box::new(CursorStrategy::default()),
            Self::NbaV1 => Box::new(PageNumberStrategy::default()),
        }
    }
}

// ============================================================================
// Client Settings
// ============================================================================

/// Tuning for the executor, backoff policy and paginator
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// API host
    pub api_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Records per page requested from the API
    pub per_page: u32,
    /// Pause between successful pages and between units
    pub courtesy_delay: Duration,
    /// Retries per page request
    pub max_retries: u32,
    /// First backoff wait
    pub backoff_base: Duration,
    /// Largest computed backoff wait
    pub backoff_cap: Duration,
    /// Optional client-side pacing
    pub requests_per_minute: Option<u32>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            per_page: 100,
            courtesy_delay: Duration::from_millis(250),
            max_retries: 10,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(60),
            requests_per_minute: None,
        }
    }
}

impl ClientSettings {
    /// Create a new settings builder
    pub fn builder() -> ClientSettingsBuilder {
        ClientSettingsBuilder::default()
    }

    /// Backoff policy for these settings
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.max_retries).with_delays(self.backoff_base, self.backoff_cap)
    }

    /// Paginator configuration for these settings
    pub fn paginator_config(&self) -> PaginatorConfig {
        PaginatorConfig::default().with_courtesy_delay(self.courtesy_delay)
    }

    /// HTTP executor configuration for these settings
    pub fn http_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::default();
        match self.requests_per_minute {
            Some(rpm) => config.with_rate_limit(RateLimiterConfig::per_minute(rpm)),
            None => config,
        }
    }

    /// Request shared by every page of every unit: endpoint, auth, page size, timeout
    pub fn base_request(&self, version: ApiVersion, credential: &Credential) -> FetchRequest {
        FetchRequest::new(version.games_endpoint(&self.api_base_url))
            .header("Authorization", credential.expose())
            .query("per_page", self.per_page.to_string())
            .timeout(self.timeout)
    }
}

/// Builder for client settings
#[derive(Default)]
pub struct ClientSettingsBuilder {
    settings: ClientSettings,
}

impl ClientSettingsBuilder {
    /// Set the API host
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.api_base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Set page size
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.settings.per_page = per_page;
        self
    }

    /// Set courtesy delay
    pub fn courtesy_delay(mut self, delay: Duration) -> Self {
        self.settings.courtesy_delay = delay;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.settings.max_retries = retries;
        self
    }

    /// Set backoff base and cap
    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.settings.backoff_base = base;
        self.settings.backoff_cap = cap;
        self
    }

    /// Enable client-side pacing
    pub fn requests_per_minute(mut self, rpm: Option<u32>) -> Self {
        self.settings.requests_per_minute = rpm;
        self
    }

    /// Build the settings
    pub fn build(self) -> ClientSettings {
        self.settings
    }
}

// ============================================================================
// Logical Units
// ============================================================================

/// Parse `"2023, 2024"` into seasons; blank entries are skipped
pub fn parse_seasons(raw: &str) -> Result<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|e| Error::invalid_value(SEASONS_ENV, format!("'{s}': {e}")))
        })
        .collect()
}

/// One date unit per day from `today - days_back` to `today`, oldest first
pub fn date_range_units(today: NaiveDate, days_back: u32) -> Result<Vec<LogicalUnit>> {
    if days_back > MAX_DAYS_BACK {
        return Err(Error::invalid_value(
            DAYS_BACK_ENV,
            format!("{days_back} exceeds the maximum of {MAX_DAYS_BACK}"),
        ));
    }

    Ok((0..=i64::from(days_back))
        .rev()
        .filter_map(|offset| today.checked_sub_signed(DateSpan::days(offset)))
        .map(LogicalUnit::Date)
        .collect())
}

/// Resolve the units of a run; date-range mode wins when both are given
pub fn resolve_units(
    seasons: Option<&str>,
    days_back: Option<u32>,
    today: NaiveDate,
) -> Result<Vec<LogicalUnit>> {
    if let Some(days) = days_back {
        return date_range_units(today, days);
    }

    let raw = seasons.ok_or_else(|| {
        Error::config(format!(
            "set {SEASONS_ENV} (e.g. \"2023,2024\") or {DAYS_BACK_ENV}"
        ))
    })?;

    let seasons = parse_seasons(raw)?;
    if seasons.is_empty() {
        return Err(Error::config(format!("{SEASONS_ENV} lists no seasons")));
    }

    Ok(seasons.into_iter().map(LogicalUnit::Season).collect())
}
