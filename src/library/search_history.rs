use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::movie::now_timestamp;
use crate::storage::Storage;

pub const SEARCH_HISTORY_LIMIT: usize = 10;
const SEARCH_HISTORY_KEY: &str = "reelshelf_search_history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub timestamp: String,
}

/// Recent free-text searches, newest first, unique by query text.
pub struct SearchHistory<'a, S> {
    storage: &'a S,
}

impl<'a, S: Storage> SearchHistory<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn entries(&self) -> Vec<SearchHistoryEntry> {
        let raw = match self.storage.get_item(SEARCH_HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read search history");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "discarding undecodable search history");
            Vec::new()
        })
    }

    pub fn recent(&self, limit: usize) -> Vec<SearchHistoryEntry> {
        let mut entries = self.entries();
        entries.truncate(limit);
        entries
    }

    pub fn record(&self, query: &str) {
        let mut entries = self.entries();
        entries.retain(|entry| entry.query != query);
        entries.insert(
            0,
            SearchHistoryEntry {
                query: query.to_string(),
                timestamp: now_timestamp(),
            },
        );
        entries.truncate(SEARCH_HISTORY_LIMIT);

        let encoded = match serde_json::to_string(&entries) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "failed to encode search history");
                return;
            }
        };
        if let Err(err) = self.storage.set_item(SEARCH_HISTORY_KEY, &encoded) {
            warn!(error = %err, "failed to write search history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn queries(entries: &[SearchHistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.query.as_str()).collect()
    }

    #[test]
    fn record_moves_repeated_query_to_front() {
        let storage = MemoryStorage::new();
        let history = SearchHistory::new(&storage);
        history.record("matrix");
        history.record("alien");
        history.record("matrix");

        assert_eq!(queries(&history.entries()), ["matrix", "alien"]);
    }

    #[test]
    fn record_caps_at_limit() {
        let storage = MemoryStorage::new();
        let history = SearchHistory::new(&storage);
        for n in 0..15 {
            history.record(&format!("q{n}"));
        }
        let entries = history.entries();
        assert_eq!(entries.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(entries[0].query, "q14");
        assert_eq!(entries[SEARCH_HISTORY_LIMIT - 1].query, "q5");
    }

    #[test]
    fn recent_returns_prefix() {
        let storage = MemoryStorage::new();
        let history = SearchHistory::new(&storage);
        for q in ["a", "b", "c", "d", "e", "f"] {
            history.record(q);
        }
        assert_eq!(queries(&history.recent(5)), ["f", "e", "d", "c", "b"]);
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage
            .set_item(SEARCH_HISTORY_KEY, "[{\"query\":")
            .expect("seed");
        let history = SearchHistory::new(&storage);
        assert!(history.entries().is_empty());

        history.record("dune");
        assert_eq!(queries(&history.entries()), ["dune"]);
    }
}
