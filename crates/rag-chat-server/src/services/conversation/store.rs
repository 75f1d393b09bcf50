use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use crate::models::chat::{SessionId, Turn};
use super::types::{SessionEntry, StoreStats};

/// Thread-safe in-memory transcript store.
/// Sharded DashMap: sessions never contend with each other beyond their shard.
#[derive(Clone, Default)]
pub struct SessionStore {
    storage: Arc<DashMap<SessionId, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        info!("Initializing session store with DashMap");
        Self {
            storage: Arc::new(DashMap::new()),
        }
    }

    /// Full transcript for `session_id`, empty if never seen.
    pub fn get(&self, session_id: &str) -> Vec<Turn> {
        self.storage
            .get(session_id)
            .map(|entry| entry.turns.clone())
            .unwrap_or_default()
    }

    /// Append turns in order, creating the transcript on first use.
    pub fn append<I>(&self, session_id: &str, turns: I)
    where
        I: IntoIterator<Item = Turn>,
    {
        let mut entry = self
            .storage
            .entry(session_id.to_string())
            .or_default();

        let before = entry.turns.len();
        entry.turns.extend(turns);
        entry.touch();

        debug!(
            "Appended {} turn(s) to session {:?} (now {})",
            entry.turns.len() - before,
            session_id,
            entry.turns.len()
        );
    }

    pub fn remove(&self, session_id: &str) -> Option<Vec<Turn>> {
        self.storage.remove(session_id).map(|(_, entry)| entry.turns)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.storage.contains_key(session_id)
    }

    /// Get number of active sessions
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Sessions with no append for at least `max_idle` as of `now`
    pub fn idle_sessions(&self, now: Instant, max_idle: Duration) -> Vec<SessionId> {
        self.storage
            .iter()
            .filter(|entry| entry.is_idle_at(now, max_idle))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remove `session_id` only if it is still idle; an append racing the
    /// sweep keeps the session alive.
    pub fn remove_if_idle(&self, session_id: &str, now: Instant, max_idle: Duration) -> bool {
        let removed = self
            .storage
            .remove_if(session_id, |_, entry| entry.is_idle_at(now, max_idle))
            .is_some();

        if removed {
            debug!("Removed idle session {:?}", session_id);
        }
        removed
    }

    pub fn stats(&self) -> StoreStats {
        let total_turns = self.storage.iter().map(|entry| entry.turns.len()).sum();
        StoreStats {
            active_sessions: self.storage.len(),
            total_turns,
        }
    }
}
