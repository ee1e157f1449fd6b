//! Pagination strategy implementations
//!
//! The games API paginated with cursors in v1 and with page numbers in the
//! NBA-scoped v1. Both read the `meta` block of the response envelope.

use super::types::{PaginationState, PaginationStrategy};
use crate::error::{Error, Result};
use crate::http::{FetchRequest, PageMeta};
use serde_json::Value;

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination
///
/// Reads `meta.next_cursor` and sends it back as `?cursor=`. A missing, null,
/// empty or zero cursor ends the run.
#[derive(Debug, Clone)]
pub struct CursorStrategy {
    /// Query parameter name for cursor
    pub cursor_param: String,
}

impl Default for CursorStrategy {
    fn default() -> Self {
        Self::new("cursor")
    }
}

impl CursorStrategy {
    /// Create a new cursor strategy
    pub fn new(cursor_param: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
        }
    }
}

impl PaginationStrategy for CursorStrategy {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn initial_state(&self) -> PaginationState {
        PaginationState::first_cursor()
    }

    fn apply(&self, request: &mut FetchRequest, state: &PaginationState) {
        match state {
            PaginationState::Cursor(Some(cursor)) => {
                request.set_param(&self.cursor_param, cursor.clone());
            }
            _ => request.remove_param(&self.cursor_param),
        }
    }

    fn next_state(&self, meta: &PageMeta) -> Result<Option<PaginationState>> {
        let cursor = match &meta.next_cursor {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            _ => return Ok(None),
        };
        Ok(Some(PaginationState::Cursor(Some(cursor))))
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Sends `?page=N` starting at 1 and follows `meta.next_page`. A missing,
/// null or zero next page ends the run.
#[derive(Debug, Clone)]
pub struct PageNumberStrategy {
    /// Query parameter name for page number
    pub page_param: String,
}

impl Default for PageNumberStrategy {
    fn default() -> Self {
        Self::new("page")
    }
}

impl PageNumberStrategy {
    /// Create a new page number strategy
    pub fn new(page_param: impl Into<String>) -> Self {
        Self {
            page_param: page_param.into(),
        }
    }
}

impl PaginationStrategy for PageNumberStrategy {
    fn name(&self) -> &'static str {
        "page_number"
    }

    fn initial_state(&self) -> PaginationState {
        PaginationState::first_page()
    }

    fn apply(&self, request: &mut FetchRequest, state: &PaginationState) {
        let page = match state {
            PaginationState::Page(page) => *page,
            PaginationState::Cursor(_) => 1,
        };
        request.set_param(&self.page_param, page.to_string());
    }

    fn next_state(&self, meta: &PageMeta) -> Result<Option<PaginationState>> {
        let page = match &meta.next_page {
            Some(Value::Number(n)) => n.as_u64(),
            // Some gateways stringify numbers
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        match page {
            None | Some(0) => Ok(None),
            Some(page) => u32::try_from(page)
                .map(|page| Some(PaginationState::Page(page)))
                .map_err(|_| {
                    Error::pagination(format!("next_page {page} is out of range"))
                }),
        }
    }
}
