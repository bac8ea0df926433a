//! Best-effort local score persistence for single-player sessions.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::rps::score::MatchState;

/// Storage key for the single-player score.
pub const SCORE_KEY: &str = "zen-rps-score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScore {
    pub local_score: u32,
    pub remote_score: u32,
}

impl From<&MatchState> for SavedScore {
    fn from(state: &MatchState) -> Self {
        Self { local_score: state.local_score, remote_score: state.remote_score }
    }
}

impl SavedScore {
    pub fn into_match(self) -> MatchState {
        MatchState::restore(self.local_score, self.remote_score)
    }
}

/// Key-value storage holding a single score record.
pub trait ScoreStore: Send {
    fn load(&self) -> Result<Option<SavedScore>>;
    fn save(&self, score: &SavedScore) -> Result<()>;
}

impl<S: ScoreStore + Sync> ScoreStore for Arc<S> {
    fn load(&self) -> Result<Option<SavedScore>> {
        (**self).load()
    }

    fn save(&self, score: &SavedScore) -> Result<()> {
        (**self).save(score)
    }
}

/// A JSON object on disk; the score lives under [`SCORE_KEY`] and other keys
/// in the file are left alone.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Result<Option<SavedScore>> {
        let mut map = self.read_map()?;
        match map.remove(SCORE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, score: &SavedScore) -> Result<()> {
        // a corrupt file is replaced rather than blocking every future save
        let mut map = self.read_map().unwrap_or_default();
        map.insert(SCORE_KEY.to_string(), serde_json::to_value(score)?);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        std::fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store, keyed the same way as the file store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: SavedScore) -> Self {
        let store = Self::new();
        if let Ok(text) = serde_json::to_string(&score) {
            if let Ok(mut entries) = store.entries.lock() {
                entries.insert(SCORE_KEY.to_string(), text);
            }
        }
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Option<SavedScore>> {
        match self.raw(SCORE_KEY) {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, score: &SavedScore) -> Result<()> {
        let text = serde_json::to_string(score)?;
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("score store lock poisoned"))?
            .insert(SCORE_KEY.to_string(), text);
        Ok(())
    }
}
