//! Tests for output module

use super::*;
use crate::testing::game;
use arrow::array::{Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, TimeZone, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs::File;
use tempfile::tempdir;
use test_case::test_case;

fn read_parquet(path: &std::path::Path) -> Vec<arrow::record_batch::RecordBatch> {
    let file = File::open(path).unwrap();
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

// ============================================================================
// GameRow / GameTable Tests
// ============================================================================

#[test]
fn test_game_row_flattens_and_renames() {
    let row = GameRow::from_record(&game(42));

    assert_eq!(row.game_id, Some(42));
    assert_eq!(
        row.game_date_utc,
        Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap())
    );
    assert_eq!(row.season, Some(2023));
    assert_eq!(row.status.as_deref(), Some("Final"));
    assert_eq!(row.home_team_id, Some(1));
    assert_eq!(row.home_team_name.as_deref(), Some("Boston Celtics"));
    assert_eq!(row.home_team_abbr.as_deref(), Some("BOS"));
    assert_eq!(row.away_team_id, Some(2));
    assert_eq!(row.away_team_name.as_deref(), Some("Brooklyn Nets"));
    assert_eq!(row.away_team_abbr.as_deref(), Some("BKN"));
    assert_eq!(row.home_score, Some(110));
    assert_eq!(row.away_score, Some(104));
}

#[test]
fn test_game_row_missing_fields_are_null() {
    let row = GameRow::from_record(&json!({"id": 7, "home_team": null, "season": "2023"}));

    assert_eq!(row.game_id, Some(7));
    assert_eq!(row.season, None);
    assert_eq!(row.home_team_name, None);
    assert_eq!(row.game_date_utc, None);
}

#[test_case("2024-01-05T00:00:00.000Z", Some("2024-01-05T00:00:00+00:00") ; "rfc3339 utc")]
#[test_case("2024-01-05T19:30:00-05:00", Some("2024-01-06T00:30:00+00:00") ; "rfc3339 offset")]
#[test_case("2024-01-05T12:00:00", Some("2024-01-05T12:00:00+00:00") ; "naive datetime")]
#[test_case("2024-01-05", Some("2024-01-05T00:00:00+00:00") ; "plain date")]
#[test_case("yesterday", None ; "garbage")]
fn test_parse_game_date(raw: &str, expected: Option<&str>) {
    let parsed = parse_game_date(raw).map(|d| d.to_rfc3339());
    assert_eq!(parsed.as_deref(), expected);
}

#[test]
fn test_game_table_dedups_first_occurrence_wins() {
    let mut later = game(2);
    later["status"] = json!("Postponed");

    let table = GameTable::from_records(&[game(1), game(2), later, game(3)]);

    assert_eq!(table.len(), 3);
    assert_eq!(table.duplicates_dropped(), 1);
    let ids: Vec<_> = table.rows().iter().map(|r| r.game_id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(table.rows()[1].status.as_deref(), Some("Final"));
}

#[test]
fn test_game_table_keeps_rows_without_id() {
    let table = GameTable::from_records(&[json!({"status": "Final"}), json!({"status": "Final"})]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.duplicates_dropped(), 0);
}

#[test]
fn test_game_table_to_record_batch() {
    let table = GameTable::from_records(&[game(1), game(2)]);
    let batch = table.to_record_batch().unwrap();

    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.schema(), games_schema());

    let names: Vec<_> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(
        names,
        vec![
            "game_id",
            "game_date_utc",
            "season",
            "status",
            "home_team_id",
            "home_team_name",
            "home_team_abbr",
            "away_team_id",
            "away_team_name",
            "away_team_abbr",
            "home_score",
            "away_score",
        ]
    );
    assert_eq!(
        batch.schema().field(1).data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
    );
}

#[test]
fn test_empty_game_table() {
    let table = GameTable::from_records(&[]);
    assert!(table.is_empty());
    assert_eq!(table.to_record_batch().unwrap().num_rows(), 0);
}

// ============================================================================
// Parquet Writer Tests
// ============================================================================

#[test]
fn test_parquet_writer_config_default() {
    let config = ParquetWriterConfig::default();
    assert_eq!(config.row_group_size(), 1024 * 1024);
    assert_eq!(
        ParquetWriterConfig::new()
            .with_row_group_size(10)
            .row_group_size(),
        10
    );
}

#[test]
fn test_write_games_parquet_round_trip() {
    let dir = tempdir().unwrap();
    let path = seasons_output_path(dir.path().join("data"), &[2023, 2024]);

    let mut missing_score = game(3);
    missing_score["home_team_score"] = json!(null);
    let table = GameTable::from_records(&[game(1), game(2), missing_score]);
    let batch = table.to_record_batch().unwrap();

    let rows = write_batch_to_parquet(&path, &batch, None).unwrap();
    assert_eq!(rows, 3);
    assert!(path.ends_with("data/games_seasons_2023_2024.parquet"));

    let batches = read_parquet(&path);
    assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 3);

    let read = &batches[0];
    let ids = read
        .column_by_name("game_id")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);

    let scores = read
        .column_by_name("home_score")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert!(scores.is_null(2));

    let dates = read
        .column_by_name("game_date_utc")
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(
        dates.value(0),
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0)
            .unwrap()
            .timestamp_micros()
    );
}

#[test]
fn test_parquet_writer_rows_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("writer.parquet");

    let batch = GameTable::from_records(&[game(1), game(2)])
        .to_record_batch()
        .unwrap();

    let config = ParquetWriterConfig::default().uncompressed();
    let mut writer = ParquetWriter::new(&path, batch.schema().as_ref(), &config).unwrap();
    assert_eq!(writer.rows_written(), 0);

    writer.write(&batch).unwrap();
    writer.write(&batch).unwrap();
    assert_eq!(writer.rows_written(), 4);

    assert_eq!(writer.close().unwrap(), 4);
}

#[test]
fn test_output_paths() {
    assert_eq!(
        seasons_output_path("data", &[2023]),
        std::path::PathBuf::from("data/games_seasons_2023.parquet")
    );
    assert_eq!(
        dates_output_path(
            "data",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        ),
        std::path::PathBuf::from("data/games_dates_2024-01-01_2024-01-07.parquet")
    );
    assert_eq!(
        snapshot_path("predictions", NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
        std::path::PathBuf::from("predictions/2024-03-09.csv")
    );
}

// ============================================================================
// Snapshot Tests
// ============================================================================

#[test]
fn test_snapshot_csv() {
    let dir = tempdir().unwrap();
    let created_at = Utc.with_ymd_and_hms(2024, 1, 5, 15, 4, 5).unwrap();

    let mut late = game(9);
    late["date"] = json!("2024-01-05T19:30:00Z");
    let table = GameTable::from_records(&[game(8), late]);

    let snapshot = Snapshot::build(&table, created_at).unwrap();
    assert_eq!(snapshot.games(), 2);

    let path = snapshot_path(dir.path().join("predictions"), created_at.date_naive());
    write_batch_to_csv(&path, snapshot.batch()).unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "game_id,game_date_utc,home_team,away_team,p_home_win,model_version,created_at_utc",
            "8,2024-01-05T00:00:00Z,Boston Celtics,Brooklyn Nets,0.55,v0_home_advantage,2024-01-05T15:04:05+00:00",
            "9,2024-01-05T19:30:00Z,Boston Celtics,Brooklyn Nets,0.55,v0_home_advantage,2024-01-05T15:04:05+00:00",
        ]
    );
}

#[test]
fn test_snapshot_without_games_writes_note() {
    let dir = tempdir().unwrap();
    let created_at = Utc.with_ymd_and_hms(2024, 7, 4, 8, 0, 0).unwrap();

    let snapshot = Snapshot::build(&GameTable::default(), created_at).unwrap();
    assert_eq!(snapshot.games(), 0);
    assert_eq!(snapshot.batch().num_rows(), 1);

    let path = dir.path().join("2024-07-04.csv");
    write_batch_to_csv(&path, snapshot.batch()).unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        csv,
        format!("created_at_utc,note\n2024-07-04T08:00:00+00:00,{NO_GAMES_NOTE}\n")
    );
}

#[test]
fn test_snapshot_columns() {
    let table = GameTable::from_records(&[game(1)]);
    let snapshot = Snapshot::build(&table, Utc::now()).unwrap();
    let batch = snapshot.batch();

    let model = batch
        .column_by_name("model_version")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(model.value(0), BASELINE_MODEL_VERSION);
    let p = batch
        .column_by_name("p_home_win")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::Float64Array>()
        .unwrap();
    assert!((p.value(0) - BASELINE_HOME_WIN).abs() < f64::EPSILON);
}
