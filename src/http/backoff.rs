//! Retry/backoff policy
//!
//! A pure decision function: given the attempt number of a failed request and
//! what went wrong, decide whether to try again and how long to wait first.
//! The caller owns the attempt counter; the policy holds no mutable state.

use async_trait::async_trait;
use std::time::Duration;

/// Why a request should (maybe) be retried
#[derive(Debug, Clone, PartialEq)]
pub enum RetrySignal {
    /// HTTP 429, with the server's `Retry-After` if it sent one
    RateLimited {
        /// Server-suggested wait
        retry_after: Option<Duration>,
    },
    /// Timeout, refused/reset connection and similar
    Transient,
    /// Any other 4xx/5xx; never retried
    Fatal,
}

impl RetrySignal {
    /// Short description for logs and exhausted-retry errors
    pub fn describe(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate limited (429)",
            Self::Transient => "transient network error",
            Self::Fatal => "fatal HTTP status",
        }
    }
}

/// Outcome of a backoff decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffDecision {
    /// Whether the request should be attempted again
    pub retry: bool,
    /// How long to wait before the next attempt
    pub wait: Duration,
}

impl BackoffDecision {
    /// Retry after `wait`
    pub fn retry_after(wait: Duration) -> Self {
        Self { retry: true, wait }
    }

    /// Give up
    pub fn give_up() -> Self {
        Self {
            retry: false,
            wait: Duration::ZERO,
        }
    }
}

/// Exponential backoff with jitter, capped, honouring `Retry-After`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Wait for the first retry, doubled for each further attempt
    pub base: Duration,
    /// Upper bound on the computed wait (not on server-suggested waits)
    pub cap: Duration,
    /// Maximum jitter added to the computed wait
    pub max_jitter: Duration,
    /// Retries allowed for a single request; attempts beyond this give up
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(60),
            max_jitter: Duration::from_secs(1),
            max_retries: 10,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with the default base, cap and jitter
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set base and cap
    #[must_use]
    pub fn with_delays(mut self, base: Duration, cap: Duration) -> Self {
        self.base = base;
        self.cap = cap;
        self
    }

    /// Set the jitter range (`Duration::ZERO` disables jitter)
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Decide for the `attempt`-th failed request (1-based), drawing jitter uniformly
    /// from `[0, max_jitter)`.
    pub fn decide(&self, attempt: u32, signal: &RetrySignal) -> BackoffDecision {
        let jitter = self.max_jitter.mul_f64(rand::random::<f64>());
        self.decide_with_jitter(attempt, signal, jitter)
    }

    /// Same as [`decide`](Self::decide) with the jitter supplied by the caller
    pub fn decide_with_jitter(
        &self,
        attempt: u32,
        signal: &RetrySignal,
        jitter: Duration,
    ) -> BackoffDecision {
        if attempt > self.max_retries {
            return BackoffDecision::give_up();
        }

        match signal {
            RetrySignal::Fatal => BackoffDecision::give_up(),
            RetrySignal::RateLimited {
                retry_after: Some(wait),
            } => BackoffDecision::retry_after(*wait),
            RetrySignal::RateLimited { retry_after: None } | RetrySignal::Transient => {
                BackoffDecision::retry_after(self.computed_wait(attempt, jitter))
            }
        }
    }

    /// `min(base * 2^(attempt-1) + jitter, cap)`
    pub fn computed_wait(&self, attempt: u32, jitter: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 2u32.saturating_pow(exponent);
        let delay = self
            .base
            .checked_mul(factor)
            .unwrap_or(self.cap)
            .saturating_add(jitter);

        std::cmp::min(delay, self.cap)
    }
}

/// Suspension point used for backoff and courtesy delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

#[cfg(test)]
mod backoff_tests {
    use super::*;
    use test_case::test_case;

    const NO_JITTER: Duration = Duration::ZERO;

    #[test_case(1, 2 ; "first retry waits base")]
    #[test_case(2, 4 ; "second retry doubles")]
    #[test_case(3, 8 ; "third retry")]
    #[test_case(5, 32 ; "fifth retry")]
    #[test_case(6, 60 ; "capped")]
    #[test_case(10, 60 ; "stays capped")]
    fn test_computed_wait(attempt: u32, expected_secs: u64) {
        let policy = BackoffPolicy::default();
        let decision = policy.decide_with_jitter(attempt, &RetrySignal::Transient, NO_JITTER);
        assert!(decision.retry);
        assert_eq!(decision.wait, Duration::from_secs(expected_secs));
    }

    #[test]
    fn test_wait_monotonic_and_bounded() {
        let policy = BackoffPolicy::new(u32::MAX);
        let jitter = Duration::from_millis(750);
        let mut previous = Duration::ZERO;
        for attempt in 1..200 {
            let wait = policy
                .decide_with_jitter(attempt, &RetrySignal::Transient, jitter)
                .wait;
            assert!(wait >= previous, "attempt {attempt} decreased");
            assert!(wait <= policy.cap);
            previous = wait;
        }
    }

    #[test]
    fn test_random_jitter_stays_in_range() {
        let policy = BackoffPolicy::default();
        for _ in 0..100 {
            let wait = policy.decide(1, &RetrySignal::Transient).wait;
            assert!(wait >= Duration::from_secs(2));
            assert!(wait < Duration::from_secs(3));
        }
    }

    #[test_case(1 ; "first attempt")]
    #[test_case(4 ; "mid attempt")]
    #[test_case(10 ; "last allowed attempt")]
    fn test_retry_after_is_exact(attempt: u32) {
        let policy = BackoffPolicy::default();
        let signal = RetrySignal::RateLimited {
            retry_after: Some(Duration::from_secs(90)),
        };
        let decision = policy.decide_with_jitter(attempt, &signal, Duration::from_millis(500));
        assert!(decision.retry);
        // Server authority is not subject to the cap
        assert_eq!(decision.wait, Duration::from_secs(90));
    }

    #[test]
    fn test_rate_limited_without_hint_uses_backoff() {
        let policy = BackoffPolicy::default();
        let signal = RetrySignal::RateLimited { retry_after: None };
        let decision = policy.decide_with_jitter(3, &signal, NO_JITTER);
        assert_eq!(decision, BackoffDecision::retry_after(Duration::from_secs(8)));
    }

    #[test]
    fn test_fatal_never_retries() {
        let policy = BackoffPolicy::default();
        let decision = policy.decide_with_jitter(1, &RetrySignal::Fatal, NO_JITTER);
        assert!(!decision.retry);
    }

    #[test]
    fn test_gives_up_past_max_retries() {
        let policy = BackoffPolicy::new(3);
        assert!(policy.decide(3, &RetrySignal::Transient).retry);
        assert!(!policy.decide(4, &RetrySignal::Transient).retry);

        let hinted = RetrySignal::RateLimited {
            retry_after: Some(Duration::from_secs(1)),
        };
        assert!(!policy.decide(4, &hinted).retry);
    }

    #[test]
    fn test_zero_retries_gives_up_immediately() {
        let policy = BackoffPolicy::new(0);
        assert!(!policy.decide(1, &RetrySignal::Transient).retry);
    }

    #[tokio::test]
    async fn test_no_sleep_returns_immediately() {
        let start = std::time::Instant::now();
        NoSleep.sleep(Duration::from_secs(30)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
