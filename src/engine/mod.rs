//! Ingestion engine module
//!
//! Runs the paginator over a sequence of logical units.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Orchestrator` - Fetches each unit in order and concatenates the records
//! - `IngestConfig` - Failure handling for a run
//! - `IngestObserver` - Progress hook (per page, per unit)

mod types;

pub use types::{
    FailedUnit, IngestConfig, IngestEvent, IngestObserver, IngestReport, IngestStats,
    NoopObserver, TracingObserver,
};

use crate::error::{Error, Result};
use crate::http::{Executor, FetchRequest};
use crate::pagination::{PageRun, PaginationStrategy, Paginator};
use crate::types::LogicalUnit;
use std::sync::Arc;
use std::time::Instant;

/// Sequential multi-unit ingestion
pub struct Orchestrator<E> {
    /// Paginator shared by every unit
    paginator: Paginator<E>,
    /// Request every unit starts from (endpoint, auth, page size, timeout)
    base_request: FetchRequest,
    /// Pagination strategy of the API version in use
    strategy: Box<dyn PaginationStrategy>,
    /// Run configuration
    config: IngestConfig,
    /// Progress hook
    observer: Arc<dyn IngestObserver>,
}

impl<E: Executor> Orchestrator<E> {
    /// Create a new orchestrator logging progress through `tracing`
    pub fn new(
        paginator: Paginator<E>,
        base_request: FetchRequest,
        strategy: Box<dyn PaginationStrategy>,
    ) -> Self {
        Self {
            paginator,
            base_request,
            strategy,
            config: IngestConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Set run configuration
    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the progress hook
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Get the paginator
    pub fn paginator(&self) -> &Paginator<E> {
        &self.paginator
    }

    /// Base request narrowed to one unit
    pub fn request_for(&self, unit: &LogicalUnit) -> FetchRequest {
        let (param, value) = unit.filter();
        let mut request = self.base_request.clone();
        request.set_param(param, value);
        request
    }

    /// Fetch all pages of a single unit
    pub async fn fetch_unit(&self, unit: &LogicalUnit) -> Result<PageRun> {
        let request = self.request_for(unit);
        let observer = &self.observer;

        self.paginator
            .fetch_all_with(&request, self.strategy.as_ref(), |progress| {
                observer.on_event(&IngestEvent::PageFetched {
                    unit: *unit,
                    page: progress.page,
                    fetched: progress.fetched,
                    unit_total: progress.total,
                });
            })
            .await
    }

    /// Fetch every unit in order and concatenate their records.
    ///
    /// With `fail_fast` (the default) the first failing unit aborts the run and
    /// its error is returned. Otherwise the failure is recorded in the report
    /// and the remaining units are still fetched.
    pub async fn run(&self, units: &[LogicalUnit]) -> Result<IngestReport> {
        if units.is_empty() {
            return Err(Error::config("no seasons or dates to ingest"));
        }

        let start = Instant::now();
        let mut report = IngestReport::default();

        for (index, unit) in units.iter().enumerate() {
            if index > 0 {
                self.paginator
                    .sleeper()
                    .sleep(self.paginator.config().courtesy_delay)
                    .await;
            }

            self.observer
                .on_event(&IngestEvent::UnitStarted { unit: *unit });

            match self.fetch_unit(unit).await {
                Ok(run) => {
                    let records = run.records.len();
                    report.records.extend(run.records);
                    report.completed_units.push(*unit);
                    report.stats.add_unit(run.pages, records);

                    self.observer.on_event(&IngestEvent::UnitCompleted {
                        unit: *unit,
                        pages: run.pages,
                        records,
                        cumulative: report.records.len(),
                    });
                }
                Err(e) => {
                    self.observer.on_event(&IngestEvent::UnitFailed {
                        unit: *unit,
                        error: e.to_string(),
                    });

                    if self.config.fail_fast {
                        return Err(e);
                    }

                    report.stats.add_failure();
                    report.failed_units.push(FailedUnit {
                        unit: *unit,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
            .stats
            .set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));

        Ok(report)
    }
}

impl<E> std::fmt::Debug for Orchestrator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("paginator", &self.paginator)
            .field("strategy", &self.strategy.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
