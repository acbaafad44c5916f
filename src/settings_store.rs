use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One accepted translation, kept newest-first in the capped history log.
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub id: u64,
}

/// The record shape shared with the other surfaces through the external
/// key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub is_active: bool,
    pub tts_enabled: bool,
    pub auto_speak: bool,
    pub overlay_enabled: bool,
    pub translation_history: Vec<HistoryEntry>,
    pub current_voice: Option<String>,
    pub speech_rate: f32,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            is_active: false,
            tts_enabled: true,
            auto_speak: true,
            overlay_enabled: true,
            translation_history: Vec::new(),
            current_voice: None,
            speech_rate: 1.0,
        }
    }
}

/// External key-value store consumed as get/set of one small JSON record.
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Option<PersistedState>>;
    fn save(&mut self, state: &PersistedState) -> Result<()>;
}

/// File-backed store for the standalone binary.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let state = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &PersistedState) -> Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
