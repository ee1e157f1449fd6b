//! Paginated fetch loop
//!
//! Drives an [`Executor`] page by page until the strategy reports exhaustion,
//! retrying rate-limited and transient failures under a [`BackoffPolicy`].

use super::types::{PaginationState, PaginationStrategy};
use crate::error::{Error, Result};
use crate::http::{
    BackoffPolicy, Executor, FetchRequest, PageMeta, ResponseOutcome, RetrySignal, Sleeper,
    TokioSleeper,
};
use crate::types::{RawGameRecord, RecordBatch};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for a paginated run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Pause between successful page fetches
    pub courtesy_delay: Duration,
    /// Upper bound on pages per run
    pub max_pages: usize,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            courtesy_delay: Duration::from_millis(250),
            max_pages: 10_000,
        }
    }
}

impl PaginatorConfig {
    /// Set courtesy delay
    #[must_use]
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// Set max pages
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Progress after one successful page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page index within the run
    pub page: usize,
    /// Records on this page
    pub fetched: usize,
    /// Records accumulated in the run so far
    pub total: usize,
}

/// Result of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRun {
    /// All records, in page order
    pub records: RecordBatch,
    /// Pages fetched
    pub pages: usize,
}

/// Paginated fetcher
pub struct Paginator<E> {
    executor: E,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    config: PaginatorConfig,
}

impl<E: Executor> Paginator<E> {
    /// Create a paginator sleeping on the tokio timer
    pub fn new(executor: E, policy: BackoffPolicy) -> Self {
        Self {
            executor,
            policy,
            sleeper: Arc::new(TokioSleeper),
            config: PaginatorConfig::default(),
        }
    }

    /// Replace the sleeper
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Get the sleeper
    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Fetch every page of `base` and return the records in page order
    pub async fn fetch_all(
        &self,
        base: &FetchRequest,
        strategy: &dyn PaginationStrategy,
    ) -> Result<RecordBatch> {
        let run = self.fetch_all_with(base, strategy, |_| {}).await?;
        Ok(run.records)
    }

    /// Fetch every page, reporting progress after each successful page
    pub async fn fetch_all_with<F>(
        &self,
        base: &FetchRequest,
        strategy: &dyn PaginationStrategy,
        mut on_page: F,
    ) -> Result<PageRun>
    where
        F: FnMut(&PageProgress) + Send,
    {
        let mut run = PageRun::default();
        let mut state = strategy.initial_state();
        let mut visited: HashSet<PaginationState> = HashSet::new();
        visited.insert(state.clone());

        loop {
            if run.pages >= self.config.max_pages {
                return Err(Error::pagination(format!(
                    "exceeded {} pages for {}",
                    self.config.max_pages, base.endpoint
                )));
            }

            let mut request = base.clone();
            strategy.apply(&mut request, &state);

            let (records, meta) = self.fetch_page(&request).await?;

            run.pages += 1;
            let fetched = records.len();
            run.records.extend(records);

            on_page(&PageProgress {
                page: run.pages,
                fetched,
                total: run.records.len(),
            });

            let Some(next) = strategy.next_state(&meta)? else {
                debug!(
                    "{} pagination exhausted after {} pages ({} records)",
                    strategy.name(),
                    run.pages,
                    run.records.len()
                );
                break;
            };

            if !visited.insert(next.clone()) {
                return Err(Error::pagination(format!(
                    "server returned {next} again after {state}; refusing to re-read it"
                )));
            }
            state = next;

            self.sleeper.sleep(self.config.courtesy_delay).await;
        }

        Ok(run)
    }

    /// Fetch a single page, retrying under the backoff policy.
    ///
    /// The attempt counter is local to this call, so it starts over for every page.
    pub async fn fetch_page(
        &self,
        request: &FetchRequest,
    ) -> Result<(Vec<RawGameRecord>, PageMeta)> {
        let mut attempt: u32 = 1;

        loop {
            let outcome = self.executor.execute(request).await?;

            let signal = match outcome {
                ResponseOutcome::Success { records, meta } => return Ok((records, meta)),
                ResponseOutcome::Fatal { status, body } => {
                    return Err(Error::http_status(status, body));
                }
                ResponseOutcome::RateLimited { retry_after } => {
                    RetrySignal::RateLimited { retry_after }
                }
                ResponseOutcome::Transient { cause } => {
                    debug!("Transient failure for {}: {cause}", request.endpoint);
                    RetrySignal::Transient
                }
            };

            let decision = self.policy.decide(attempt, &signal);
            if !decision.retry {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: signal.describe().to_string(),
                });
            }

            warn!(
                "{}. Waiting {:.1}s (attempt {}/{})",
                signal.describe(),
                decision.wait.as_secs_f64(),
                attempt,
                self.policy.max_retries
            );
            self.sleeper.sleep(decision.wait).await;
            attempt += 1;
        }
    }
}

impl<E> std::fmt::Debug for Paginator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
