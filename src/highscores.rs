//! High score record
//!
//! Scores live in a process-wide key-value store that survives restarts.
//! The game only ever writes one record on game over: the last score is
//! always overwritten, the high score only when beaten.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Store keys
pub mod keys {
    pub const HIGH_SCORE: &str = "highScore";
    pub const HIGH_SCORE_DATE: &str = "highScoreDate";
    pub const LAST_SCORE: &str = "lastScore";
    pub const LAST_SCORE_DATE: &str = "lastScoreDate";
    pub const WAS_MINIMIZED: &str = "wasMinimized";
}

/// Placeholder date for a score that was never set
pub const NO_DATE: &str = "N/A";

/// A typed value in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Persistent key-value store with batched writes
pub trait KeyValueStore: Send {
    /// Read a committed value
    fn get(&self, key: &str) -> Result<Option<StoreValue>>;

    /// Stage a write; nothing is durable until `commit`
    fn put(&mut self, key: &str, value: StoreValue);

    /// Make staged writes durable. Staged writes survive a failed commit.
    fn commit(&mut self) -> Result<()>;

    /// Drop staged writes
    fn discard(&mut self);

    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Ok(Some(StoreValue::Int(v))) => v,
            _ => default,
        }
    }

    fn get_text(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Ok(Some(StoreValue::Text(v))) => v,
            _ => default.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Ok(Some(StoreValue::Bool(v))) => v,
            _ => default,
        }
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoreValue>,
    staged: Vec<(String, StoreValue)>,
    failing_commits: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail, as an unavailable store would
    pub fn fail_next_commits(&mut self, count: u32) {
        self.failing_commits = count;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: StoreValue) {
        self.staged.push((key.to_string(), value));
    }

    fn commit(&mut self) -> Result<()> {
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(Error::StoreUnavailable("memory store offline".into()));
        }
        for (key, value) in self.staged.drain(..) {
            self.values.insert(key, value);
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.staged.clear();
    }
}

/// Store backed by a JSON object in a single file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoreValue>,
    staged: Vec<(String, StoreValue)>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            log::info!("No score file at {}, starting fresh", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values,
            staged: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: StoreValue) {
        self.staged.push((key.to_string(), value));
    }

    fn commit(&mut self) -> Result<()> {
        let mut next = self.values.clone();
        for (key, value) in &self.staged {
            next.insert(key.clone(), value.clone());
        }

        // Write next to the target, then swap it in
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&next)?)?;
        fs::rename(&tmp, &self.path)?;

        self.values = next;
        self.staged.clear();
        log::debug!("Scores saved to {}", self.path.display());
        Ok(())
    }

    fn discard(&mut self) {
        self.staged.clear();
    }
}

/// Last and best score with the dates they were set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    pub last_score: u32,
    pub last_score_date: String,
    pub high_score: u32,
    pub high_score_date: String,
}

impl Default for HighScoreRecord {
    fn default() -> Self {
        Self {
            last_score: 0,
            last_score_date: NO_DATE.to_string(),
            high_score: 0,
            high_score_date: NO_DATE.to_string(),
        }
    }
}

impl HighScoreRecord {
    /// Read the record, falling back to defaults for missing keys
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            last_score: store.get_int(keys::LAST_SCORE, 0).max(0) as u32,
            last_score_date: store.get_text(keys::LAST_SCORE_DATE, NO_DATE),
            high_score: store.get_int(keys::HIGH_SCORE, 0).max(0) as u32,
            high_score_date: store.get_text(keys::HIGH_SCORE_DATE, NO_DATE),
        }
    }
}

/// Result of recording a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The score beat the stored high score
    pub new_high_score: bool,
    /// The write reached the store
    pub saved: bool,
}

/// The game's only door to durable storage
pub struct ScoreGateway {
    store: Box<dyn KeyValueStore>,
}

impl ScoreGateway {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Current record
    pub fn record(&self) -> HighScoreRecord {
        HighScoreRecord::load(self.store.as_ref())
    }

    /// Record a finished run dated today
    pub fn on_game_over(&mut self, score: u32) -> RecordOutcome {
        let today = chrono::Local::now().date_naive();
        self.record_game_over(score, today)
    }

    /// Record a finished run.
    ///
    /// Never fails: a rejected write is retried once, then dropped with a warning.
    pub fn record_game_over(&mut self, score: u32, date: NaiveDate) -> RecordOutcome {
        let stamp = format_date(date);
        let high_score = self.store.get_int(keys::HIGH_SCORE, 0);
        let new_high_score = i64::from(score) > high_score;

        if new_high_score {
            self.store
                .put(keys::HIGH_SCORE, StoreValue::Int(i64::from(score)));
            self.store
                .put(keys::HIGH_SCORE_DATE, StoreValue::Text(stamp.clone()));
        }
        self.store
            .put(keys::LAST_SCORE, StoreValue::Int(i64::from(score)));
        self.store.put(keys::LAST_SCORE_DATE, StoreValue::Text(stamp));

        let saved = self.commit_with_retry("score");
        if saved && new_high_score {
            log::info!("New high score: {}", score);
        }
        RecordOutcome {
            new_high_score,
            saved,
        }
    }

    /// A run is starting: the app is no longer considered minimized
    pub fn mark_run_started(&mut self) -> bool {
        self.set_was_minimized(false)
    }

    pub fn set_was_minimized(&mut self, minimized: bool) -> bool {
        self.store
            .put(keys::WAS_MINIMIZED, StoreValue::Bool(minimized));
        self.commit_with_retry("wasMinimized flag")
    }

    pub fn was_minimized(&self) -> bool {
        self.store.get_bool(keys::WAS_MINIMIZED, false)
    }

    fn commit_with_retry(&mut self, what: &str) -> bool {
        match self.store.commit() {
            Ok(()) => return true,
            Err(e) => log::warn!("Saving {} failed, retrying once: {}", what, e),
        }
        match self.store.commit() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Saving {} failed again, dropping write: {}", what, e);
                self.store.discard();
                false
            }
        }
    }
}

/// `M/D/YYYY` without zero padding
pub fn format_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Score lines for the start screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartScreenScores {
    pub record: HighScoreRecord,
}

impl StartScreenScores {
    pub fn new(record: HighScoreRecord) -> Self {
        Self { record }
    }

    /// Lines to show; scores that were never set are left out
    pub fn lines(&self) -> Vec<String> {
        let r = &self.record;
        let mut lines = Vec::new();
        if r.high_score > 0 && r.high_score_date != NO_DATE {
            lines.push(format!("Top Score: {} ({})", r.high_score, r.high_score_date));
        }
        if r.last_score > 0 && r.last_score_date != NO_DATE {
            lines.push(format!("Last Score: {} ({})", r.last_score, r.last_score_date));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_unpadded() {
        assert_eq!(format_date(date(2024, 3, 7)), "3/7/2024");
        assert_eq!(format_date(date(2023, 12, 25)), "12/25/2023");
    }

    #[test]
    fn test_empty_store_defaults() {
        let gateway = ScoreGateway::new(MemoryStore::new());
        let record = gateway.record();
        assert_eq!(record, HighScoreRecord::default());
        assert_eq!(record.high_score_date, "N/A");
        assert!(!gateway.was_minimized());
    }

    #[test]
    fn test_first_game_sets_both() {
        let mut gateway = ScoreGateway::new(MemoryStore::new());
        let outcome = gateway.record_game_over(7, date(2024, 1, 2));
        assert!(outcome.new_high_score);
        assert!(outcome.saved);

        let record = gateway.record();
        assert_eq!(record.high_score, 7);
        assert_eq!(record.high_score_date, "1/2/2024");
        assert_eq!(record.last_score, 7);
        assert_eq!(record.last_score_date, "1/2/2024");
    }

    #[test]
    fn test_lower_score_only_updates_last() {
        let mut gateway = ScoreGateway::new(MemoryStore::new());
        gateway.record_game_over(10, date(2024, 1, 2));
        let outcome = gateway.record_game_over(4, date(2024, 2, 3));
        assert!(!outcome.new_high_score);

        let record = gateway.record();
        assert_eq!(record.high_score, 10);
        assert_eq!(record.high_score_date, "1/2/2024");
        assert_eq!(record.last_score, 4);
        assert_eq!(record.last_score_date, "2/3/2024");
    }

    #[test]
    fn test_equal_score_is_not_a_new_high() {
        let mut gateway = ScoreGateway::new(MemoryStore::new());
        gateway.record_game_over(10, date(2024, 1, 2));
        let outcome = gateway.record_game_over(10, date(2024, 5, 5));
        assert!(!outcome.new_high_score);
        assert_eq!(gateway.record().high_score_date, "1/2/2024");
    }

    #[test]
    fn test_single_failure_is_retried() {
        let mut store = MemoryStore::new();
        store.fail_next_commits(1);
        let mut gateway = ScoreGateway::new(store);
        let outcome = gateway.record_game_over(3, date(2024, 1, 2));
        assert!(outcome.saved);
        assert_eq!(gateway.record().last_score, 3);
    }

    #[test]
    fn test_double_failure_is_dropped() {
        let mut store = MemoryStore::new();
        store.fail_next_commits(2);
        let mut gateway = ScoreGateway::new(store);
        let outcome = gateway.record_game_over(3, date(2024, 1, 2));
        assert!(!outcome.saved);
        assert_eq!(gateway.record(), HighScoreRecord::default());

        // The dropped write does not leak into the next one
        gateway.mark_run_started();
        assert_eq!(gateway.record().last_score, 0);
    }

    #[test]
    fn test_was_minimized_flag() {
        let mut gateway = ScoreGateway::new(MemoryStore::new());
        assert!(gateway.set_was_minimized(true));
        assert!(gateway.was_minimized());
        assert!(gateway.mark_run_started());
        assert!(!gateway.was_minimized());
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            let mut gateway = ScoreGateway::new(store);
            gateway.record_game_over(12, date(2024, 6, 9));
            gateway.set_was_minimized(true);
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get_int(keys::HIGH_SCORE, 0), 12);
        assert_eq!(store.get_text(keys::HIGH_SCORE_DATE, NO_DATE), "6/9/2024");
        assert!(store.get_bool(keys::WAS_MINIMIZED, false));
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_json_store_unwritable_path_fails_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("scores.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.put(keys::LAST_SCORE, StoreValue::Int(1));
        assert!(store.commit().is_err());
    }

    #[test]
    fn test_start_screen_lines() {
        let empty = StartScreenScores::new(HighScoreRecord::default());
        assert!(empty.lines().is_empty());

        let scores = StartScreenScores::new(HighScoreRecord {
            last_score: 3,
            last_score_date: "2/1/2024".into(),
            high_score: 9,
            high_score_date: "1/1/2024".into(),
        });
        assert_eq!(
            scores.lines(),
            vec![
                "Top Score: 9 (1/1/2024)".to_string(),
                "Last Score: 3 (2/1/2024)".to_string(),
            ]
        );
    }
}
