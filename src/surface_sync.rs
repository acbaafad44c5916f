use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::broadcast;

use crate::settings_store::{HistoryEntry, PersistedState, SettingsStore};

/// Default cap on the persisted translation history
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Events fanned out to whichever surfaces happen to be listening.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    TranslationUpdate {
        text: String,
        confidence: f32,
        status: String,
    },
    StatusUpdate {
        status: String,
    },
    Error {
        message: String,
    },
}

/// Append-only translation log, newest-first, capped.
pub struct TranslationHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
    next_id: u64,
}

impl TranslationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
            next_id: 1,
        }
    }

    /// Rebuild from a persisted snapshot (newest-first).
    pub fn restore(&mut self, entries: Vec<HistoryEntry>) {
        self.next_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        self.entries = entries.into_iter().take(self.limit).collect();
    }

    /// Prepend a new entry, evicting from the tail past the cap.
    pub fn append(&mut self, text: &str, timestamp_ms: i64) -> HistoryEntry {
        let entry = HistoryEntry {
            text: text.to_string(),
            timestamp: timestamp_ms,
            id: self.next_id,
        };
        self.next_id += 1;
        self.entries.push_front(entry.clone());
        self.entries.truncate(self.limit);
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first snapshot.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Propagates translation/status/error events to detachable listeners and
/// keeps the persisted history current.
///
/// Delivery is strictly best-effort: a closed or lagging listener is the
/// listener's problem, never the pipeline's. History appends happen whether
/// or not anyone is subscribed.
pub struct SurfaceSync {
    tx: broadcast::Sender<SyncEvent>,
    history: TranslationHistory,
    store: Option<Box<dyn SettingsStore>>,
    persisted: PersistedState,
}

impl SurfaceSync {
    pub fn new(history_limit: usize, store: Option<Box<dyn SettingsStore>>) -> Self {
        let (tx, _) = broadcast::channel(64);
        let mut history = TranslationHistory::new(history_limit);

        let mut persisted = PersistedState::default();
        if let Some(store) = &store {
            match store.load() {
                Ok(Some(state)) => {
                    history.restore(state.translation_history.clone());
                    persisted = state;
                }
                Ok(None) => {}
                Err(e) => eprintln!("Failed to load persisted state: {}", e),
            }
        }

        Self {
            tx,
            history,
            store,
            persisted,
        }
    }

    /// Attach a surface. It may drop the receiver at any time.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub fn history(&self) -> &TranslationHistory {
        &self.history
    }

    pub fn persisted(&self) -> &PersistedState {
        &self.persisted
    }

    pub fn set_active(&mut self, active: bool) {
        self.persisted.is_active = active;
        self.persist();
    }

    /// Record an accepted, non-no-gesture translation: append to history,
    /// persist, then notify listeners.
    pub fn record_translation(&mut self, text: &str, confidence: f32, timestamp_ms: i64) {
        self.history.append(text, timestamp_ms);
        self.persisted.translation_history = self.history.snapshot();
        self.persist();

        self.publish(SyncEvent::TranslationUpdate {
            text: text.to_string(),
            confidence,
            status: "active".to_string(),
        });
    }

    pub fn publish_status(&self, status: &str) {
        self.publish(SyncEvent::StatusUpdate {
            status: status.to_string(),
        });
    }

    pub fn publish_error(&self, message: &str) {
        self.publish(SyncEvent::Error {
            message: message.to_string(),
        });
    }

    /// Fire-and-forget delivery; a send error only means nobody is listening.
    fn publish(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    fn persist(&mut self) {
        if let Some(store) = &mut self.store {
            if let Err(e) = store.save(&self.persisted) {
                eprintln!("Failed to persist state: {}", e);
            }
        }
    }
}
