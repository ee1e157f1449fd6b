//! Engine types
//!
//! Progress events, configuration and the report of an ingestion run.

use crate::error::Error;
use crate::types::{LogicalUnit, RecordBatch};
use tracing::{info, warn};

/// Progress observation emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A unit is about to be fetched
    UnitStarted {
        /// The unit
        unit: LogicalUnit,
    },
    /// One page of a unit was fetched
    PageFetched {
        /// The unit
        unit: LogicalUnit,
        /// 1-based page index within the unit
        page: usize,
        /// Records on this page
        fetched: usize,
        /// Records of this unit so far
        unit_total: usize,
    },
    /// A unit finished
    UnitCompleted {
        /// The unit
        unit: LogicalUnit,
        /// Pages fetched for the unit
        pages: usize,
        /// Records fetched for the unit
        records: usize,
        /// Records of the whole run so far
        cumulative: usize,
    },
    /// A unit failed
    UnitFailed {
        /// The unit
        unit: LogicalUnit,
        /// Error message
        error: String,
    },
}

/// Receives progress events; purely observational
pub trait IngestObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &IngestEvent);
}

/// Logs progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl IngestObserver for TracingObserver {
    fn on_event(&self, event: &IngestEvent) {
        match event {
            IngestEvent::UnitStarted { unit } => info!("Fetching {unit} ..."),
            IngestEvent::PageFetched {
                unit,
                page,
                fetched,
                unit_total,
            } => info!("  {unit} | page {page} | fetched {fetched} | total {unit_total}"),
            IngestEvent::UnitCompleted {
                unit,
                pages,
                records,
                cumulative,
            } => info!(
                "Completed {unit}: {records} records in {pages} pages ({cumulative} overall)"
            ),
            IngestEvent::UnitFailed { unit, error } => warn!("Failed {unit}: {error}"),
        }
    }
}

/// Ignores all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl IngestObserver for NoopObserver {
    fn on_event(&self, _event: &IngestEvent) {}
}

/// Configuration for an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Abort the run on the first failed unit
    pub fail_fast: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { fail_fast: true }
    }
}

impl IngestConfig {
    /// Create a new ingest config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// A unit that failed while `fail_fast` was off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit {
    /// The unit
    pub unit: LogicalUnit,
    /// Error message
    pub error: String,
}

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Units completed
    pub units_completed: usize,
    /// Units failed
    pub units_failed: usize,
    /// Pages fetched across all completed units
    pub pages_fetched: usize,
    /// Records fetched across all completed units
    pub records_fetched: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl IngestStats {
    /// Record a completed unit
    pub fn add_unit(&mut self, pages: usize, records: usize) {
        self.units_completed += 1;
        self.pages_fetched += pages;
        self.records_fetched += records;
    }

    /// Record a failed unit
    pub fn add_failure(&mut self) {
        self.units_failed += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Result of an ingestion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Records of all completed units, in unit order then page order
    pub records: RecordBatch,
    /// Units that completed, in run order
    pub completed_units: Vec<LogicalUnit>,
    /// Units that failed (only when `fail_fast` is off)
    pub failed_units: Vec<FailedUnit>,
    /// Statistics
    pub stats: IngestStats,
}

impl IngestReport {
    /// True when every unit completed
    pub fn is_complete(&self) -> bool {
        self.failed_units.is_empty()
    }

    /// Error summarising the failed units, if any
    pub fn failure(&self) -> Option<Error> {
        if self.is_complete() {
            return None;
        }

        let units = self
            .failed_units
            .iter()
            .map(|f| format!("{} ({})", f.unit, f.error))
            .collect::<Vec<_>>()
            .join(", ");

        Some(Error::UnitsFailed {
            failed: self.failed_units.len(),
            total: self.failed_units.len() + self.completed_units.len(),
            units,
        })
    }
}
