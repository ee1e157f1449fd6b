//! In-memory doubles for the executor and sleeper seams

use crate::error::Result;
use crate::http::{Executor, FetchRequest, PageMeta, ResponseOutcome, Sleeper};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays scripted outcomes in order and records every request.
///
/// Running out of script is reported as a fatal 599 so a runaway loop fails
/// the test instead of hanging.
#[derive(Default)]
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<ResponseOutcome>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: impl IntoIterator<Item = ResponseOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, request: &FetchRequest) -> Result<ResponseOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ResponseOutcome::fatal(599, "script exhausted")))
    }
}

/// Records requested waits without waiting
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

pub fn game(id: i64) -> Value {
    json!({
        "id": id,
        "date": "2024-01-05",
        "season": 2023,
        "status": "Final",
        "home_team": {"id": 1, "full_name": "Boston Celtics", "abbreviation": "BOS"},
        "visitor_team": {"id": 2, "full_name": "Brooklyn Nets", "abbreviation": "BKN"},
        "home_team_score": 110,
        "visitor_team_score": 104
    })
}

pub fn cursor_page(ids: &[i64], next: Option<&str>) -> ResponseOutcome {
    let meta = next.map_or_else(PageMeta::last, |cursor| PageMeta::cursor(cursor));
    ResponseOutcome::success(ids.iter().copied().map(game).collect(), meta)
}

pub fn numbered_page(ids: &[i64], next: Option<u32>) -> ResponseOutcome {
    let meta = next.map_or_else(PageMeta::last, PageMeta::page);
    ResponseOutcome::success(ids.iter().copied().map(game).collect(), meta)
}
