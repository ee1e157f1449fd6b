//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{resolve_units, ApiVersion, Credential};
use crate::database::SqlRunner;
use crate::engine::{IngestConfig, IngestReport, Orchestrator};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpExecutor, Sleeper, TokioSleeper};
use crate::output::{
    dates_output_path, seasons_output_path, snapshot_path, write_batch_to_csv,
    write_batch_to_parquet, GameTable, Snapshot,
};
use crate::pagination::Paginator;
use crate::types::LogicalUnit;
use chrono::{NaiveDate, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    sleeper: Arc<dyn Sleeper>,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used for backoff and courtesy waits
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run the CLI command, reading the credential from the environment when
    /// the command calls the API
    pub async fn run(&self) -> Result<()> {
        if let Commands::Sql { parquet, sql_file } = &self.cli.command {
            return self.sql(parquet, sql_file);
        }

        let credential = Credential::from_env()?;
        self.run_with_credential(&credential).await
    }

    /// Run the CLI command with an explicit credential
    pub async fn run_with_credential(&self, credential: &Credential) -> Result<()> {
        match &self.cli.command {
            Commands::Ingest {
                seasons,
                days_back,
                api_version,
                continue_on_error,
                output_dir,
            } => {
                let today = Utc::now().date_naive();
                let units = resolve_units(seasons.as_deref(), *days_back, today)?;
                self.ingest(credential, &units, *api_version, *continue_on_error, output_dir)
                    .await
                    .map(|_| ())
            }
            Commands::Today {
                date,
                api_version,
                output_dir,
            } => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                self.today(credential, date, *api_version, output_dir)
                    .await
                    .map(|_| ())
            }
            Commands::Sql { parquet, sql_file } => self.sql(parquet, sql_file),
        }
    }

    /// Build the orchestrator for one API version
    fn orchestrator(
        &self,
        credential: &Credential,
        version: ApiVersion,
        fail_fast: bool,
    ) -> Result<Orchestrator<HttpExecutor>> {
        let settings = self.cli.client.settings();
        let executor = HttpExecutor::with_config(settings.http_config())?;

        let paginator = Paginator::new(executor, settings.backoff_policy())
            .with_sleeper(self.sleeper.clone())
            .with_config(settings.paginator_config());

        Ok(Orchestrator::new(
            paginator,
            settings.base_request(version, credential),
            version.strategy(),
        )
        .with_config(IngestConfig::new().with_fail_fast(fail_fast)))
    }

    /// Fetch the units and write their games to Parquet.
    ///
    /// Returns the written file, or `None` when the API returned no games.
    /// The file is named after the units that completed. When some units
    /// failed (continue-on-error mode), the games of the others are still
    /// written and [`Error::UnitsFailed`] is returned afterwards.
    pub async fn ingest(
        &self,
        credential: &Credential,
        units: &[LogicalUnit],
        api_version: Option<ApiVersion>,
        continue_on_error: bool,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let date_mode = units.first().is_some_and(|u| !u.is_season());
        let version = api_version.unwrap_or(if date_mode {
            ApiVersion::NbaV1
        } else {
            ApiVersion::V1
        });

        info!(
            "Ingesting {} unit(s) via {}",
            units.len(),
            version.games_path()
        );

        let report = self
            .orchestrator(credential, version, !continue_on_error)?
            .run(units)
            .await?;
        log_report(&report);

        if report.completed_units.is_empty() {
            if let Some(err) = report.failure() {
                return Err(err);
            }
        }

        let table = GameTable::from_records(&report.records);
        let written = if table.is_empty() {
            info!("No games returned.");
            None
        } else {
            let path = output_path(output_dir, &report.completed_units)?;
            let rows = write_batch_to_parquet(&path, &table.to_record_batch()?, None)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            info!("Saved {} rows to {}", rows, path.display());
            Some(path)
        };

        match report.failure() {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    /// Fetch one date's games and write the prediction snapshot CSV
    pub async fn today(
        &self,
        credential: &Credential,
        date: NaiveDate,
        api_version: ApiVersion,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let report = self
            .orchestrator(credential, api_version, true)?
            .run(&[LogicalUnit::Date(date)])
            .await?;

        let table = GameTable::from_records(&report.records);
        let snapshot = Snapshot::build(&table, Utc::now())?;

        let path = snapshot_path(output_dir, date);
        write_batch_to_csv(&path, snapshot.batch())
            .with_context(|| format!("Failed to save {}", path.display()))?;

        if snapshot.games() == 0 {
            info!("Wrote {}", path.display());
        } else {
            info!("Wrote {} with {} games", path.display(), snapshot.games());
        }

        Ok(path)
    }

    /// Run a SQL script over a games Parquet file and print the results
    pub fn sql(&self, parquet: &Path, sql_file: &Path) -> Result<()> {
        let script = fs::read_to_string(sql_file).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", sql_file.display()))
        })?;

        if script.trim().is_empty() {
            println!("{} is empty.", sql_file.display());
            return Ok(());
        }

        let runner = SqlRunner::open(parquet)?;
        let report = runner.run_script(&script);
        print!("{}", report.render());

        if let Some(failed) = report.failure() {
            warn!(
                "Stopped at query {}; {} statement(s) not run",
                failed.index, report.skipped
            );
        }

        Ok(())
    }
}

fn log_report(report: &IngestReport) {
    for failed in &report.failed_units {
        warn!("Skipped {}: {}", failed.unit, failed.error);
    }
    info!(
        "Fetched {} records in {} pages from {} unit(s) ({} failed) in {} ms",
        report.stats.records_fetched,
        report.stats.pages_fetched,
        report.stats.units_completed,
        report.stats.units_failed,
        report.stats.duration_ms
    );
}

/// Parquet file for a run: named after its seasons, or its first and last date
pub fn output_path(output_dir: &Path, units: &[LogicalUnit]) -> Result<PathBuf> {
    let seasons: Vec<i32> = units
        .iter()
        .filter_map(|u| match u {
            LogicalUnit::Season(season) => Some(*season),
            LogicalUnit::Date(_) => None,
        })
        .collect();
    let dates: Vec<NaiveDate> = units
        .iter()
        .filter_map(|u| match u {
            LogicalUnit::Date(date) => Some(*date),
            LogicalUnit::Season(_) => None,
        })
        .collect();

    match (dates.iter().min(), dates.iter().max()) {
        (Some(first), Some(last)) if seasons.is_empty() => {
            Ok(dates_output_path(output_dir, *first, *last))
        }
        (None, None) if !seasons.is_empty() => Ok(seasons_output_path(output_dir, &seasons)),
        _ => Err(Error::config(
            "a run must list either seasons or dates, not both",
        )),
    }
}
