//! CLI commands and argument parsing
//!
//! Every argument falls back to an environment variable, so each command
//! runs with no flags at all.

use crate::config::{ApiVersion, ClientSettings, DEFAULT_API_BASE_URL};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Basketball games ingestion CLI
#[derive(Parser, Debug)]
#[command(name = "hoops-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// HTTP client tuning shared by the fetching commands
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// API host
    #[arg(long, global = true, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Retries per page request on 429 or network errors
    #[arg(long, global = true, env = "MAX_RETRIES", default_value = "10")]
    pub max_retries: u32,

    /// Pause between pages and between units (milliseconds)
    #[arg(long, global = true, env = "COURTESY_DELAY_MS", default_value = "250")]
    pub courtesy_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[arg(long, global = true, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Records per page
    #[arg(long, global = true, env = "PER_PAGE", default_value = "100")]
    pub per_page: u32,

    /// Client-side pacing (requests per minute)
    #[arg(long, global = true, env = "REQUESTS_PER_MINUTE")]
    pub requests_per_minute: Option<u32>,
}

impl ClientArgs {
    /// Build client settings
    pub fn settings(&self) -> ClientSettings {
        ClientSettings::builder()
            .api_base_url(self.api_base_url.clone())
            .max_retries(self.max_retries)
            .courtesy_delay(Duration::from_millis(self.courtesy_delay_ms))
            .timeout(Duration::from_secs(self.timeout_secs))
            .per_page(self.per_page)
            .requests_per_minute(self.requests_per_minute)
            .build()
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch games for seasons or a trailing date range and write Parquet
    Ingest {
        /// Comma-separated seasons, e.g. "2023,2024"
        #[arg(long, env = "SEASONS")]
        seasons: Option<String>,

        /// Fetch today and the previous N days instead of seasons
        #[arg(long, env = "DAYS_BACK")]
        days_back: Option<u32>,

        /// API version (default: v1 for seasons, nba-v1 for dates)
        #[arg(long, env = "API_VERSION", value_enum)]
        api_version: Option<ApiVersion>,

        /// Keep going when a season or date fails
        #[arg(long, env = "CONTINUE_ON_ERROR")]
        continue_on_error: bool,

        /// Directory for the Parquet file
        #[arg(short, long, env = "OUTPUT_DIR", default_value = "data")]
        output_dir: PathBuf,
    },

    /// Write today's games with the baseline home-win probability to CSV
    Today {
        /// Date to snapshot (default: today, UTC)
        #[arg(long, env = "PREDICT_DATE")]
        date: Option<NaiveDate>,

        /// API version
        #[arg(long, env = "API_VERSION", value_enum, default_value = "nba-v1")]
        api_version: ApiVersion,

        /// Directory for the CSV file
        #[arg(short, long, env = "PREDICTIONS_DIR", default_value = "predictions")]
        output_dir: PathBuf,
    },

    /// Run a SQL script against a games Parquet file
    Sql {
        /// Parquet file exposed as the `games` view
        #[arg(long, env = "PARQUET_PATH", default_value = "data/games_seasons_2023_2024.parquet")]
        parquet: PathBuf,

        /// Script of `;`-separated statements
        #[arg(long, env = "SQL_FILE", default_value = "analysis/eda.sql")]
        sql_file: PathBuf,
    },
}
