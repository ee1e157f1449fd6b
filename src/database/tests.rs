//! Tests for database module

use super::*;
use crate::output::{write_batch_to_parquet, GameTable};
use crate::testing::game;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::{tempdir, TempDir};

fn games_file() -> (TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("games_seasons_2023.parquet");

    let mut away_win = game(3);
    away_win["home_team_score"] = json!(98);
    let batch = GameTable::from_records(&[game(1), game(2), away_win])
        .to_record_batch()
        .unwrap();
    write_batch_to_parquet(&path, &batch, None).unwrap();

    (dir, path)
}

#[test]
fn test_split_statements() {
    let script = "SELECT 1;\n\n  SELECT 2 ;;\n-- trailing comment\n";
    assert_eq!(
        split_statements(script),
        vec!["SELECT 1", "SELECT 2", "-- trailing comment"]
    );
    assert!(split_statements("  ;\n ; ").is_empty());
}

#[test]
fn test_query_games_view() {
    let (_dir, path) = games_file();
    let runner = SqlRunner::open(&path).unwrap();
    assert_eq!(runner.parquet_path(), path.as_path());

    let output = runner
        .query(
            "SELECT count(*) AS n, \
             CAST(sum(CASE WHEN home_score > away_score THEN 1 ELSE 0 END) AS BIGINT) AS home_wins \
             FROM games",
        )
        .unwrap();

    assert_eq!(output.rows, 1);
    assert!(output.table.contains("home_wins"));
    assert!(output.table.contains("| 3"));
    assert!(output.table.contains("| 2"));
}

#[test]
fn test_missing_parquet_is_config_error() {
    let dir = tempdir().unwrap();
    let err = SqlRunner::open(dir.path().join("nope.parquet")).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_run_script_in_order() {
    let (_dir, path) = games_file();
    let runner = SqlRunner::open(&path).unwrap();

    let report = runner.run_script(
        "SELECT game_id FROM games ORDER BY game_id;\nSELECT DISTINCT home_team_abbr FROM games;",
    );

    assert!(report.failure().is_none());
    assert_eq!(report.skipped, 0);
    assert_eq!(report.statements.len(), 2);
    assert_eq!(report.statements[0].index, 1);
    assert_eq!(report.statements[0].sql, "SELECT game_id FROM games ORDER BY game_id");
    assert_eq!(report.statements[0].outcome.as_ref().unwrap().rows, 3);
    assert_eq!(report.statements[1].outcome.as_ref().unwrap().rows, 1);
}

#[test]
fn test_run_script_stops_at_first_error() {
    let (_dir, path) = games_file();
    let runner = SqlRunner::open(&path).unwrap();

    let report = runner.run_script(
        "SELECT 1; SELECT no_such_column FROM games; SELECT 2; SELECT 3",
    );

    assert_eq!(report.statements.len(), 2);
    assert_eq!(report.skipped, 2);

    let failure = report.failure().unwrap();
    assert_eq!(failure.index, 2);
    assert!(failure.outcome.as_ref().unwrap_err().contains("no_such_column"));
}

#[test]
fn test_run_empty_script() {
    let (_dir, path) = games_file();
    let runner = SqlRunner::open(&path).unwrap();

    let report = runner.run_script("\n  \n");
    assert!(report.statements.is_empty());
    assert!(report.failure().is_none());
}

#[test]
fn test_render_script_report() {
    let (_dir, path) = games_file();
    let runner = SqlRunner::open(&path).unwrap();

    let rendered = runner.run_script("SELECT 1 AS one; SELEC 2").render();

    assert!(rendered.contains("Query 1\n====================\nSELECT 1 AS one\n"));
    assert!(rendered.contains("\nResult:\n"));
    assert!(rendered.contains("| one |"));
    assert!(rendered.contains("Query 2"));
    assert!(rendered.contains("Error in Query 2:"));
}
