//! CLI module
//!
//! Command-line interface for the ingestion jobs.
//!
//! # Commands
//!
//! - `ingest` - Fetch seasons or a date range into a Parquet file
//! - `today` - Write the daily prediction snapshot
//! - `sql` - Run a SQL script over a games Parquet file

mod commands;
mod runner;

pub use commands::{ClientArgs, Cli, Commands};
pub use runner::{output_path, Runner};
