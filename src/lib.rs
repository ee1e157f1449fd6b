// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]
#![allow(clippy::format_push_string)]

//! # hoops-ingest
//!
//! Resilient, paginated ingestion of basketball game records from a
//! rate-limited HTTP API into Parquet.
//!
//! ## Features
//!
//! - **Retrying fetches**: 429 and network errors back off exponentially with
//!   jitter, honouring `Retry-After`; any other error status is fatal
//! - **Two pagination schemes**: opaque cursor (`v1`) and page number (`nba-v1`)
//! - **Logical units**: seasons, or a trailing window of dates, fetched in order
//! - **Arrow Output**: flat, deduplicated game table written to Parquet
//! - **Ad hoc SQL**: DuckDB view over the written file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hoops_ingest::config::{ApiVersion, ClientSettings, Credential};
//! use hoops_ingest::engine::Orchestrator;
//! use hoops_ingest::http::HttpExecutor;
//! use hoops_ingest::pagination::Paginator;
//! use hoops_ingest::{LogicalUnit, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let credential = Credential::from_env()?;
//!     let settings = ClientSettings::default();
//!     let version = ApiVersion::V1;
//!
//!     let paginator = Paginator::new(
//!         HttpExecutor::with_config(settings.http_config())?,
//!         settings.backoff_policy(),
//!     );
//!     let orchestrator = Orchestrator::new(
//!         paginator,
//!         settings.base_request(version, &credential),
//!         version.strategy(),
//!     );
//!
//!     let report = orchestrator.run(&[LogicalUnit::Season(2023)]).await?;
//!     println!("{} games", report.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Orchestrator: units in order, concatenated        │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────┬────────────────────┐
//! │   Paginator  │        Executor          │      Output        │
//! ├──────────────┼──────────────────────────┼────────────────────┤
//! │ Cursor       │ GET + timeout            │ GameTable (dedup)  │
//! │ Page number  │ 429 / transient / fatal  │ Parquet, CSV       │
//! │ Backoff      │ Rate limit               │ DuckDB SQL         │
//! └──────────────┴──────────────────────────┴────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credential, API version, client settings and unit resolution
pub mod config;

/// HTTP executor with backoff and rate limiting
pub mod http;

/// Pagination strategies and the retrying paginator
pub mod pagination;

/// Multi-unit ingestion
pub mod engine;

/// Arrow/Parquet/CSV output
pub mod output;

/// Ad hoc SQL via DuckDB
pub mod database;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
