//! Pagination types and traits
//!
//! Defines the state a paginated run carries between requests and the
//! strategy trait the two API versions implement.

use crate::error::Result;
use crate::http::{FetchRequest, PageMeta};
use std::fmt;

/// Position of a paginated run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaginationState {
    /// Cursor pagination; `None` is the first page
    Cursor(Option<String>),
    /// Page-number pagination, 1-based
    Page(u32),
}

impl PaginationState {
    /// First page of a cursor run
    pub fn first_cursor() -> Self {
        Self::Cursor(None)
    }

    /// First page of a page-number run
    pub fn first_page() -> Self {
        Self::Page(1)
    }

    /// Check if this is the first page
    pub fn is_first(&self) -> bool {
        matches!(self, Self::Cursor(None) | Self::Page(1))
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cursor(None) => write!(f, "first page"),
            Self::Cursor(Some(cursor)) => write!(f, "cursor {cursor}"),
            Self::Page(page) => write!(f, "page {page}"),
        }
    }
}

/// How an API version paginates.
///
/// A run is driven by exactly one strategy; the paginator never inspects the
/// state itself beyond handing it back to the strategy.
pub trait PaginationStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// State of the first request
    fn initial_state(&self) -> PaginationState;

    /// Rewrite `request` so it asks for the page `state` points at
    fn apply(&self, request: &mut FetchRequest, state: &PaginationState);

    /// State of the following request, or `None` when the run is exhausted.
    ///
    /// Errors when `meta` names a next page this strategy cannot request.
    fn next_state(&self, meta: &PageMeta) -> Result<Option<PaginationState>>;
}
