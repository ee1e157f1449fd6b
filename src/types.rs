//! Common types used throughout hoops-ingest
//!
//! This module contains shared type definitions, type aliases,
//! and the logical units an ingestion run iterates over.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// One game object exactly as the API returned it.
///
/// The ingestion core never looks inside; flattening happens in
/// [`crate::output::GameTable`].
pub type RawGameRecord = JsonValue;

/// Ordered records of one ingestion, in API page order.
pub type RecordBatch = Vec<RawGameRecord>;

// ============================================================================
// Logical Units
// ============================================================================

/// Query parameter used to filter by season
pub const SEASON_PARAM: &str = "seasons[]";

/// Query parameter used to filter by date
pub const DATE_PARAM: &str = "dates[]";

/// One independently paginated slice of the game catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalUnit {
    /// A season, identified by its starting year (e.g. 2023 for 2023-24)
    Season(i32),
    /// A single calendar date
    Date(NaiveDate),
}

impl LogicalUnit {
    /// Query parameter name and value that restrict a request to this unit
    pub fn filter(&self) -> (&'static str, String) {
        match self {
            Self::Season(season) => (SEASON_PARAM, season.to_string()),
            Self::Date(date) => (DATE_PARAM, date.format("%Y-%m-%d").to_string()),
        }
    }

    /// Check if this is a season unit
    pub fn is_season(&self) -> bool {
        matches!(self, Self::Season(_))
    }
}

impl fmt::Display for LogicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season(season) => write!(f, "season {season}"),
            Self::Date(date) => write!(f, "date {}", date.format("%Y-%m-%d")),
        }
    }
}
