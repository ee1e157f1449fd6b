//! Ad-hoc SQL over the games file via DuckDB
//!
//! The Parquet output of an ingestion run is queried through an in-memory
//! DuckDB connection; no database server is involved.

mod engine;

pub use engine::{
    split_statements, QueryOutput, ScriptReport, SqlRunner, StatementResult, GAMES_VIEW,
};

#[cfg(test)]
mod tests;
