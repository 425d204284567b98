use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::movie::{MovieRecord, now_timestamp};
use crate::storage::Storage;

use super::{Collection, Shelf};

pub const WATCH_HISTORY_LIMIT: usize = 50;

/// Durable favorites, watchlist and watch history on top of a [`Storage`].
///
/// Every operation absorbs storage faults: reads degrade to an empty
/// collection, writes report `false`. Nothing here returns an error.
pub struct LibraryStore<S> {
    storage: S,
}

/// One element of a stored collection array. Elements that do not decode as
/// a record are kept verbatim so a rewrite of the key does not drop them.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Slot {
    Record(MovieRecord),
    Unreadable(Value),
}

impl Slot {
    fn is(&self, imdb_id: &str) -> bool {
        matches!(self, Slot::Record(record) if record.imdb_id == imdb_id)
    }
}

impl<S: Storage> LibraryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn get_all(&self, collection: Collection) -> Vec<MovieRecord> {
        self.load(collection)
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Record(record) => Some(record),
                Slot::Unreadable(_) => None,
            })
            .collect()
    }

    pub fn add(&self, shelf: Shelf, record: &MovieRecord) -> bool {
        let collection = Collection::from(shelf);
        let mut slots = self.load(collection);
        if slots.iter().any(|slot| slot.is(&record.imdb_id)) {
            debug!(imdb_id = %record.imdb_id, collection = collection.label(), "already present");
            return false;
        }

        let mut entry = record.clone();
        entry.added_date = Some(now_timestamp());
        slots.insert(0, Slot::Record(entry));
        self.persist(collection, &slots)
    }

    /// Records a playback. An existing entry is replaced where it stands;
    /// a new one goes to the front. The oldest entries fall off past
    /// [`WATCH_HISTORY_LIMIT`].
    pub fn add_with_duration(&self, record: &MovieRecord, duration_secs: f64) -> bool {
        let mut history = self.load(Collection::WatchHistory);
        let mut entry = record.clone();
        entry.duration = Some(duration_secs);
        entry.watched_date = Some(now_timestamp());

        match history.iter().position(|slot| slot.is(&record.imdb_id)) {
            Some(idx) => history[idx] = Slot::Record(entry),
            None => history.insert(0, Slot::Record(entry)),
        }
        history.truncate(WATCH_HISTORY_LIMIT);

        self.persist(Collection::WatchHistory, &history)
    }

    pub fn remove(&self, collection: Collection, imdb_id: &str) -> bool {
        let mut slots = self.load(collection);
        slots.retain(|slot| !slot.is(imdb_id));
        self.persist(collection, &slots)
    }

    pub fn contains(&self, collection: Collection, imdb_id: &str) -> bool {
        self.get_all(collection)
            .iter()
            .any(|entry| entry.imdb_id == imdb_id)
    }

    pub fn clear_history(&self) -> bool {
        self.remove_key(Collection::WatchHistory)
    }

    pub fn clear_all(&self) -> bool {
        Collection::ALL
            .into_iter()
            .fold(true, |ok, collection| self.remove_key(collection) && ok)
    }

    fn remove_key(&self, collection: Collection) -> bool {
        let key = collection.storage_key();
        match self.storage.remove_item(key) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "failed to clear library collection");
                false
            }
        }
    }

    fn load(&self, collection: Collection) -> Vec<Slot> {
        let key = collection.storage_key();
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "failed to read library collection");
                return Vec::new();
            }
        };
        let values = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(key, error = %err, "discarding undecodable library collection");
                return Vec::new();
            }
        };
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match MovieRecord::deserialize(&value) {
                Ok(record) => Slot::Record(record),
                Err(err) => {
                    warn!(key, index, error = %err, "skipping unreadable library entry");
                    Slot::Unreadable(value)
                }
            })
            .collect()
    }

    fn persist(&self, collection: Collection, slots: &[Slot]) -> bool {
        let key = collection.storage_key();
        let encoded = match serde_json::to_string(slots) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "failed to encode library collection");
                return false;
            }
        };
        match self.storage.set_item(key, &encoded) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "failed to write library collection");
                false
            }
        }
    }
}
