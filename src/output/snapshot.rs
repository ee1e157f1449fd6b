//! Daily prediction snapshot
//!
//! A per-date CSV listing the scheduled games with a constant home-advantage
//! baseline probability.

use super::games::GameTable;
use crate::error::Result;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Home-win probability assigned to every game
pub const BASELINE_HOME_WIN: f64 = 0.55;

/// Model version written next to the baseline
pub const BASELINE_MODEL_VERSION: &str = "v0_home_advantage";

/// Note written when the date has no games
pub const NO_GAMES_NOTE: &str = "No games scheduled for this date via API";

/// Snapshot of one date's games
#[derive(Debug, Clone)]
pub struct Snapshot {
    batch: RecordBatch,
    games: usize,
}

impl Snapshot {
    /// Build the snapshot rows; an empty table yields a single note row
    pub fn build(table: &GameTable, created_at: DateTime<Utc>) -> Result<Self> {
        let created_at = created_at.to_rfc3339_opts(SecondsFormat::Secs, false);

        if table.is_empty() {
            let schema = Schema::new(vec![
                Field::new("created_at_utc", DataType::Utf8, false),
                Field::new("note", DataType::Utf8, false),
            ]);
            let batch = RecordBatch::try_new(
                Arc::new(schema),
                vec![
                    Arc::new(StringArray::from(vec![created_at])),
                    Arc::new(StringArray::from(vec![NO_GAMES_NOTE])),
                ],
            )?;
            return Ok(Self { batch, games: 0 });
        }

        let rows = table.rows();
        let n = rows.len();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(rows.iter().map(|r| r.game_id).collect::<Int64Array>()),
            Arc::new(
                rows.iter()
                    .map(|r| {
                        r.game_date_utc
                            .map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                    })
                    .collect::<StringArray>(),
            ),
            Arc::new(
                rows.iter()
                    .map(|r| r.home_team_name.as_deref())
                    .collect::<StringArray>(),
            ),
            Arc::new(
                rows.iter()
                    .map(|r| r.away_team_name.as_deref())
                    .collect::<StringArray>(),
            ),
            Arc::new(Float64Array::from(vec![BASELINE_HOME_WIN; n])),
            Arc::new(StringArray::from(vec![BASELINE_MODEL_VERSION; n])),
            Arc::new(StringArray::from(vec![created_at; n])),
        ];

        let batch = RecordBatch::try_new(snapshot_schema(), columns)?;
        Ok(Self { batch, games: n })
    }

    /// Rows to write
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of games (0 for the note row)
    pub fn games(&self) -> usize {
        self.games
    }
}

fn snapshot_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("game_id", DataType::Int64, true),
        Field::new("game_date_utc", DataType::Utf8, true),
        Field::new("home_team", DataType::Utf8, true),
        Field::new("away_team", DataType::Utf8, true),
        Field::new("p_home_win", DataType::Float64, false),
        Field::new("model_version", DataType::Utf8, false),
        Field::new("created_at_utc", DataType::Utf8, false),
    ]))
}

/// `<dir>/<YYYY-MM-DD>.csv`
pub fn snapshot_path(dir: impl AsRef<Path>, date: NaiveDate) -> PathBuf {
    dir.as_ref().join(format!("{}.csv", date.format("%Y-%m-%d")))
}
