use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::storage::reading::Reading;

/// Concurrent map from location to its append-only reading history.
///
/// Readers share the lock and never block each other; an append takes it
/// exclusively for the in-memory push only. `get` hands back a copy, so a
/// snapshot is never affected by later appends.
#[derive(Debug, Default)]
pub struct ReadingStore {
    // keyed by location -> readings in observation order
    histories: RwLock<HashMap<String, Vec<Reading>>>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `reading` to the end of `location`'s history, creating it on first write.
    pub async fn append(&self, location: &str, reading: Reading) {
        self.histories
            .write()
            .await
            .entry(location.to_string())
            .or_default()
            .push(reading);
    }

    /// Snapshot of the history for `location`, `None` if it was never written.
    pub async fn get(&self, location: &str) -> Option<Vec<Reading>> {
        self.histories.read().await.get(location).cloned()
    }

    pub async fn latest(&self, location: &str) -> Option<Reading> {
        self.histories
            .read()
            .await
            .get(location)
            .and_then(|history| history.last().cloned())
    }

    pub async fn len(&self, location: &str) -> usize {
        self.histories
            .read()
            .await
            .get(location)
            .map_or(0, Vec::len)
    }

    pub async fn locations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.histories.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
