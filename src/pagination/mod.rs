//! Pagination module
//!
//! Supports: Cursor, Page Number
//!
//! # Overview
//!
//! The [`Paginator`] walks a multi-page result set to completion. Which
//! pagination scheme it follows is a [`PaginationStrategy`] chosen by the
//! caller from the API version; the loop itself never branches on it.

mod paginator;
mod strategies;
mod types;

pub use paginator::{PageProgress, PageRun, Paginator, PaginatorConfig};
pub use strategies::{CursorStrategy, PageNumberStrategy};
pub use types::{PaginationState, PaginationStrategy};
