//! HTTP module
//!
//! Provides the request executor, the retry/backoff policy it is driven by,
//! and optional client-side pacing.
//!
//! # Features
//!
//! - **Outcome classification**: success, rate-limited, transient, fatal
//! - **Backoff Policy**: exponential with jitter, capped, honouring `Retry-After`
//! - **Rate Limiting**: token bucket pacer using governor

mod backoff;
mod executor;
mod rate_limit;

pub use backoff::{BackoffDecision, BackoffPolicy, NoSleep, RetrySignal, Sleeper, TokioSleeper};
pub use executor::{
    excerpt, parse_retry_after, Executor, FetchRequest, HttpClientConfig, HttpExecutor, PageMeta,
    ResponseOutcome, BODY_EXCERPT_CHARS,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
