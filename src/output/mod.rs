//! Output module
//!
//! Turns raw game records into Arrow RecordBatches and writes them to disk.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Flattening and deduplicating game records (`GameTable`)
//! - Writing Parquet and CSV files
//! - Building the daily prediction snapshot

mod games;
mod snapshot;
mod writer;

pub use games::{games_schema, parse_game_date, GameRow, GameTable};
pub use snapshot::{
    snapshot_path, Snapshot, BASELINE_HOME_WIN, BASELINE_MODEL_VERSION, NO_GAMES_NOTE,
};
pub use writer::{
    dates_output_path, seasons_output_path, write_batch_to_csv, write_batch_to_parquet,
    ParquetWriter, ParquetWriterConfig,
};

#[cfg(test)]
mod tests;
