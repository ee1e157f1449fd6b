//! Flat game table
//!
//! Selects and renames the fixed set of game fields from raw API records and
//! converts them to an Arrow RecordBatch. This layer owns deduplication: a
//! game id seen twice in one run is kept once (first occurrence wins).

use crate::error::Result;
use crate::types::RawGameRecord;
use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// One flattened game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRow {
    pub game_id: Option<i64>,
    pub game_date_utc: Option<DateTime<Utc>>,
    pub season: Option<i64>,
    pub status: Option<String>,
    pub home_team_id: Option<i64>,
    pub home_team_name: Option<String>,
    pub home_team_abbr: Option<String>,
    pub away_team_id: Option<i64>,
    pub away_team_name: Option<String>,
    pub away_team_abbr: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl GameRow {
    /// Flatten one raw record; missing or mistyped fields become `None`
    pub fn from_record(record: &RawGameRecord) -> Self {
        Self {
            game_id: int_at(record, &["id"]),
            game_date_utc: str_at(record, &["date"]).as_deref().and_then(parse_game_date),
            season: int_at(record, &["season"]),
            status: str_at(record, &["status"]),
            home_team_id: int_at(record, &["home_team", "id"]),
            home_team_name: str_at(record, &["home_team", "full_name"]),
            home_team_abbr: str_at(record, &["home_team", "abbreviation"]),
            away_team_id: int_at(record, &["visitor_team", "id"]),
            away_team_name: str_at(record, &["visitor_team", "full_name"]),
            away_team_abbr: str_at(record, &["visitor_team", "abbreviation"]),
            home_score: int_at(record, &["home_team_score"]),
            away_score: int_at(record, &["visitor_team_score"]),
        }
    }
}

/// Rows of one run, deduplicated by game id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTable {
    rows: Vec<GameRow>,
    duplicates_dropped: usize,
}

impl GameTable {
    /// Flatten records in order, dropping repeated game ids
    pub fn from_records(records: &[RawGameRecord]) -> Self {
        let mut seen = HashSet::new();
        let mut table = Self::default();

        for row in records.iter().map(GameRow::from_record) {
            if let Some(id) = row.game_id {
                if !seen.insert(id) {
                    table.duplicates_dropped += 1;
                    continue;
                }
            }
            table.rows.push(row);
        }

        if table.duplicates_dropped > 0 {
            debug!(
                "Dropped {} duplicate game records",
                table.duplicates_dropped
            );
        }

        table
    }

    /// Rows in API order
    pub fn rows(&self) -> &[GameRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Records skipped because their game id was already present
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Convert to an Arrow RecordBatch with [`games_schema`]
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let rows = &self.rows;
        let ints = |f: fn(&GameRow) -> Option<i64>| -> ArrayRef {
            Arc::new(rows.iter().map(f).collect::<Int64Array>())
        };
        let strs = |f: fn(&GameRow) -> Option<&str>| -> ArrayRef {
            Arc::new(rows.iter().map(f).collect::<StringArray>())
        };

        let dates: TimestampMicrosecondArray = rows
            .iter()
            .map(|r| r.game_date_utc.map(|d| d.timestamp_micros()))
            .collect();

        let columns: Vec<ArrayRef> = vec![
            ints(|r| r.game_id),
            Arc::new(dates.with_timezone("UTC")),
            ints(|r| r.season),
            strs(|r| r.status.as_deref()),
            ints(|r| r.home_team_id),
            strs(|r| r.home_team_name.as_deref()),
            strs(|r| r.home_team_abbr.as_deref()),
            ints(|r| r.away_team_id),
            strs(|r| r.away_team_name.as_deref()),
            strs(|r| r.away_team_abbr.as_deref()),
            ints(|r| r.home_score),
            ints(|r| r.away_score),
        ];

        Ok(RecordBatch::try_new(games_schema(), columns)?)
    }
}

/// Schema of the games file
pub fn games_schema() -> SchemaRef {
    let int = |name: &str| Field::new(name, DataType::Int64, true);
    let text = |name: &str| Field::new(name, DataType::Utf8, true);

    Arc::new(Schema::new(vec![
        int("game_id"),
        Field::new(
            "game_date_utc",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            true,
        ),
        int("season"),
        text("status"),
        int("home_team_id"),
        text("home_team_name"),
        text("home_team_abbr"),
        int("away_team_id"),
        text("away_team_name"),
        text("away_team_abbr"),
        int("home_score"),
        int("away_score"),
    ]))
}

/// Parse an API date: RFC 3339, naive date-time (UTC assumed) or plain date
/// (midnight UTC)
pub fn parse_game_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn value_at<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(record, |current, key| current.get(key))
}

fn int_at(record: &Value, path: &[&str]) -> Option<i64> {
    value_at(record, path).and_then(Value::as_i64)
}

fn str_at(record: &Value, path: &[&str]) -> Option<String> {
    value_at(record, path)
        .and_then(Value::as_str)
        .map(str::to_string)
}
