//! In-memory cache of notification lists, keyed by the view that queried them.
//!
//! Entries are fresh for a fixed window after they were fetched. Invalidation
//! marks entries stale without dropping their data, so a view can keep showing
//! the last list until the next fetch succeeds.
//!
//! Every invalidation starts a new generation. A fetch records the generation
//! it started in; if an invalidation happened while it was in flight its
//! result is stored stale, never overwrites a newer entry, and has the ids
//! removed since then stripped out.
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::model::{Notification, RoleScope};

/// How many generations a removed id is remembered for late inserts.
const REMOVED_WINDOW: u64 = 64;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<Notification>,
    fetched_at: Instant,
    generation: u64,
    invalidated: bool,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<RoleScope, Entry>,
    generation: u64,
    /// id -> generation in which it was removed
    removed: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct QueryCache {
    stale_after: Duration,
    state: Mutex<State>,
    changes: watch::Sender<u64>,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            stale_after,
            state: Mutex::new(State::default()),
            changes,
        }
    }

    /// Receiver that ticks whenever any cached list changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }

    /// Current generation; pass it to [`QueryCache::insert`] for a fetch
    /// started now.
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Cached list for `key` if it is within the freshness window and has not
    /// been invalidated.
    pub async fn get_fresh(&self, key: &RoleScope) -> Option<Vec<Notification>> {
        let state = self.state.lock().await;
        state
            .entries
            .get(key)
            .filter(|e| !e.invalidated && e.fetched_at.elapsed() < self.stale_after)
            .map(|e| e.data.clone())
    }

    /// Last stored list for `key`, fresh or not.
    pub async fn get(&self, key: &RoleScope) -> Option<Vec<Notification>> {
        self.state
            .lock()
            .await
            .entries
            .get(key)
            .map(|e| e.data.clone())
    }

    /// Store a fetch result that started in generation `since` and return the
    /// list the cache now holds for `key`.
    pub async fn insert(
        &self,
        key: RoleScope,
        mut data: Vec<Notification>,
        since: u64,
    ) -> Vec<Notification> {
        let stored = {
            let mut state = self.state.lock().await;
            let current = state.generation;
            if since != current {
                let removed = &state.removed;
                data.retain(|n| removed.get(&n.id).map_or(true, |g| *g <= since));
            }
            let newer = state
                .entries
                .get(&key)
                .filter(|e| e.generation > since)
                .map(|e| e.data.clone());
            match newer {
                Some(existing) => existing,
                None => {
                    state.entries.insert(
                        key,
                        Entry {
                            data: data.clone(),
                            fetched_at: Instant::now(),
                            generation: since,
                            invalidated: since != current,
                        },
                    );
                    data
                }
            }
        };
        self.notify();
        stored
    }

    /// Mark every entry stale and start a new generation; the next read of
    /// any key refetches.
    pub async fn invalidate_all(&self) {
        {
            let mut state = self.state.lock().await;
            state.generation += 1;
            for entry in state.entries.values_mut() {
                entry.invalidated = true;
            }
            let floor = state.generation.saturating_sub(REMOVED_WINDOW);
            state.removed.retain(|_, g| *g > floor);
        }
        self.notify();
    }

    /// Drop notification `id` from every cached list and from any fetch still
    /// in flight. Returns how many lists contained it.
    pub async fn remove_notification(&self, id: &str) -> usize {
        let touched = {
            let mut state = self.state.lock().await;
            let generation = state.generation;
            state.removed.insert(id.to_string(), generation);
            let mut touched = 0;
            for entry in state.entries.values_mut() {
                let before = entry.data.len();
                entry.data.retain(|n| n.id != id);
                if entry.data.len() != before {
                    touched += 1;
                }
            }
            touched
        };
        if touched > 0 {
            self.notify();
        }
        touched
    }

    pub async fn keys(&self) -> Vec<RoleScope> {
        self.state.lock().await.entries.keys().cloned().collect()
    }
}
