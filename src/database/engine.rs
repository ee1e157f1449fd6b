//! DuckDB-based SQL runner
//!
//! Exposes a games Parquet file as the `games` view of an in-memory DuckDB
//! connection and runs a script of `;`-separated statements against it.

use crate::error::{Error, Result};
use duckdb::arrow::util::pretty::pretty_format_batches;
use duckdb::Connection;
use std::path::{Path, PathBuf};

/// Name of the view the Parquet file is exposed as
pub const GAMES_VIEW: &str = "games";

/// Output of one successful statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    /// Result rendered as a text table
    pub table: String,
    /// Number of result rows
    pub rows: usize,
}

/// Outcome of one statement of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementResult {
    /// 1-based position in the script
    pub index: usize,
    /// Statement text, trimmed
    pub sql: String,
    /// Result table, or the error message
    pub outcome: std::result::Result<QueryOutput, String>,
}

/// Result of running a script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Statements that ran, in order; the last one may have failed
    pub statements: Vec<StatementResult>,
    /// Statements never run because an earlier one failed
    pub skipped: usize,
}

impl ScriptReport {
    /// The failing statement, if any
    pub fn failure(&self) -> Option<&StatementResult> {
        self.statements.iter().find(|s| s.outcome.is_err())
    }

    /// Console rendering: a banner, the statement, then its result or error
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str("\n====================\n");
            out.push_str(&format!("Query {}\n", statement.index));
            out.push_str("====================\n");
            out.push_str(&statement.sql);
            out.push('\n');
            match &statement.outcome {
                Ok(output) => {
                    out.push_str("\nResult:\n");
                    out.push_str(&output.table);
                    out.push('\n');
                }
                Err(e) => out.push_str(&format!("\nError in Query {}: {e}\n", statement.index)),
            }
        }
        out
    }
}

/// In-memory DuckDB session over a games Parquet file
pub struct SqlRunner {
    /// DuckDB connection
    conn: Connection,
    /// Parquet file behind the view
    parquet_path: PathBuf,
}

impl SqlRunner {
    /// Open an in-memory connection and create the `games` view
    pub fn open(parquet_path: impl AsRef<Path>) -> Result<Self> {
        let parquet_path = parquet_path.as_ref().to_path_buf();

        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        let location = parquet_path.to_string_lossy().replace('\'', "''");
        let create_view = format!(
            "CREATE OR REPLACE VIEW {GAMES_VIEW} AS SELECT * FROM read_parquet('{location}');"
        );

        tracing::debug!("Executing query: {}", create_view);

        conn.execute_batch(&create_view).map_err(|e| {
            Error::config(format!(
                "Failed to open {} as view '{GAMES_VIEW}': {e}",
                parquet_path.display()
            ))
        })?;

        Ok(Self { conn, parquet_path })
    }

    /// Parquet file behind the view
    pub fn parquet_path(&self) -> &Path {
        &self.parquet_path
    }

    /// Run one statement and render its result
    pub fn query(&self, sql: &str) -> Result<QueryOutput> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<_> = stmt.query_arrow([])?.collect();

        let rows = batches.iter().map(|b| b.num_rows()).sum();
        let table = pretty_format_batches(&batches)
            .map_err(|e| Error::output(format!("Failed to format result: {e}")))?
            .to_string();

        Ok(QueryOutput { table, rows })
    }

    /// Run every statement of a script in order, stopping at the first error
    pub fn run_script(&self, script: &str) -> ScriptReport {
        let statements = split_statements(script);
        let total = statements.len();
        let mut report = ScriptReport::default();

        for (i, sql) in statements.into_iter().enumerate() {
            let outcome = self.query(&sql).map_err(|e| e.to_string());
            let failed = outcome.is_err();

            report.statements.push(StatementResult {
                index: i + 1,
                sql,
                outcome,
            });

            if failed {
                report.skipped = total - (i + 1);
                break;
            }
        }

        report
    }
}

impl std::fmt::Debug for SqlRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlRunner")
            .field("parquet_path", &self.parquet_path)
            .finish_non_exhaustive()
    }
}

/// Split a script on `;`, dropping blank statements
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
