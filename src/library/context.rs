use tracing::info;

use crate::movie::MovieRecord;
use crate::storage::Storage;

use super::store::LibraryStore;
use super::{Collection, Shelf};

/// In-memory mirror of the library for synchronous membership queries.
///
/// Mutations go through the store and then re-read the touched collection,
/// so the mirror matches storage once any mutating call returns.
pub struct LibraryContext<S> {
    store: LibraryStore<S>,
    favorites: Vec<MovieRecord>,
    watchlist: Vec<MovieRecord>,
    watch_history: Vec<MovieRecord>,
}

impl<S: Storage> LibraryContext<S> {
    pub fn new(store: LibraryStore<S>) -> Self {
        let mut context = Self {
            store,
            favorites: Vec::new(),
            watchlist: Vec::new(),
            watch_history: Vec::new(),
        };
        context.reload();
        context
    }

    pub fn store(&self) -> &LibraryStore<S> {
        &self.store
    }

    pub fn reload(&mut self) {
        for collection in Collection::ALL {
            self.refresh(collection);
        }
    }

    pub fn favorites(&self) -> &[MovieRecord] {
        &self.favorites
    }

    pub fn watchlist(&self) -> &[MovieRecord] {
        &self.watchlist
    }

    pub fn watch_history(&self) -> &[MovieRecord] {
        &self.watch_history
    }

    pub fn collection(&self, collection: Collection) -> &[MovieRecord] {
        match collection {
            Collection::Favorites => &self.favorites,
            Collection::Watchlist => &self.watchlist,
            Collection::WatchHistory => &self.watch_history,
        }
    }

    pub fn toggle_favorite(&mut self, movie: &MovieRecord) -> bool {
        self.toggle(Shelf::Favorites, movie)
    }

    pub fn toggle_watchlist(&mut self, movie: &MovieRecord) -> bool {
        self.toggle(Shelf::Watchlist, movie)
    }

    pub fn add_movie_to_history(&mut self, movie: &MovieRecord, elapsed_secs: f64) {
        self.store.add_with_duration(movie, elapsed_secs);
        self.refresh(Collection::WatchHistory);
    }

    pub fn clear_watch_history(&mut self) -> bool {
        let cleared = self.store.clear_history();
        self.refresh(Collection::WatchHistory);
        cleared
    }

    pub fn remove_from(&mut self, collection: Collection, imdb_id: &str) {
        self.store.remove(collection, imdb_id);
        self.refresh(collection);
    }

    pub fn clear_all(&mut self) -> bool {
        let cleared = self.store.clear_all();
        self.reload();
        cleared
    }

    pub fn is_favorite(&self, imdb_id: &str) -> bool {
        self.favorites.iter().any(|entry| entry.imdb_id == imdb_id)
    }

    pub fn is_in_watchlist(&self, imdb_id: &str) -> bool {
        self.watchlist.iter().any(|entry| entry.imdb_id == imdb_id)
    }

    fn toggle(&mut self, shelf: Shelf, movie: &MovieRecord) -> bool {
        let collection = Collection::from(shelf);
        if self.store.contains(collection, &movie.imdb_id) {
            self.store.remove(collection, &movie.imdb_id);
        } else {
            self.store.add(shelf, movie);
        }
        self.refresh(collection);
        // A rejected write leaves membership unchanged; report what storage holds.
        let member = self
            .collection(collection)
            .iter()
            .any(|entry| entry.imdb_id == movie.imdb_id);
        info!(
            imdb_id = %movie.imdb_id,
            collection = collection.label(),
            member,
            "toggled library membership"
        );
        member
    }

    fn refresh(&mut self, collection: Collection) {
        let records = self.store.get_all(collection);
        match collection {
            Collection::Favorites => self.favorites = records,
            Collection::Watchlist => self.watchlist = records,
            Collection::WatchHistory => self.watch_history = records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    /// Accepts writes but refuses every delete.
    struct UndeletableStorage(MemoryStorage);

    impl Storage for UndeletableStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set_item(key, value)
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Backend(rusqlite::Error::InvalidQuery))
        }
    }

    fn context() -> LibraryContext<MemoryStorage> {
        LibraryContext::new(LibraryStore::new(MemoryStorage::new()))
    }

    fn movie(id: &str) -> MovieRecord {
        MovieRecord::new(id).with_field("Title", format!("Movie {id}"))
    }

    fn assert_mirror_matches_store(ctx: &LibraryContext<MemoryStorage>) {
        for collection in Collection::ALL {
            assert_eq!(
                ctx.collection(collection),
                ctx.store().get_all(collection).as_slice(),
                "mirror out of sync for {}",
                collection.label()
            );
        }
    }

    #[test]
    fn toggle_favorite_reports_new_state_and_is_an_involution() {
        let mut ctx = context();
        let m = movie("tt1");

        assert!(ctx.toggle_favorite(&m));
        assert!(ctx.is_favorite("tt1"));
        assert_mirror_matches_store(&ctx);

        assert!(!ctx.toggle_favorite(&m));
        assert!(!ctx.is_favorite("tt1"));
        assert!(ctx.favorites().is_empty());
        assert_mirror_matches_store(&ctx);
    }

    #[test]
    fn toggle_watchlist_is_independent_of_favorites() {
        let mut ctx = context();
        let m = movie("tt1");

        assert!(ctx.toggle_watchlist(&m));
        assert!(ctx.is_in_watchlist("tt1"));
        assert!(!ctx.is_favorite("tt1"));

        assert!(ctx.toggle_favorite(&m));
        assert!(!ctx.toggle_watchlist(&m));
        assert!(ctx.is_favorite("tt1"));
        assert!(!ctx.is_in_watchlist("tt1"));
        assert_mirror_matches_store(&ctx);
    }

    #[test]
    fn mirror_is_loaded_from_existing_storage() {
        let store = LibraryStore::new(MemoryStorage::new());
        store.add(Shelf::Favorites, &movie("tt7"));
        store.add_with_duration(&movie("tt8"), 33.0);

        let ctx = LibraryContext::new(store);
        assert!(ctx.is_favorite("tt7"));
        assert_eq!(ctx.watch_history().len(), 1);
        assert_eq!(ctx.watch_history()[0].duration, Some(33.0));
    }

    #[test]
    fn membership_queries_read_the_mirror_only() {
        let mut ctx = context();
        ctx.toggle_favorite(&movie("tt1"));

        // Out-of-band write: the mirror keeps its snapshot until the next refresh.
        ctx.store().remove(Collection::Favorites, "tt1");
        assert!(ctx.is_favorite("tt1"));

        ctx.reload();
        assert!(!ctx.is_favorite("tt1"));
    }

    #[test]
    fn history_add_and_clear_keep_mirror_in_sync() {
        let mut ctx = context();
        ctx.add_movie_to_history(&movie("tt1"), 0.0);
        ctx.add_movie_to_history(&movie("tt2"), 61.5);
        assert_eq!(ctx.watch_history().len(), 2);
        assert_eq!(ctx.watch_history()[0].imdb_id, "tt2");
        assert_mirror_matches_store(&ctx);

        ctx.toggle_favorite(&movie("tt1"));
        assert!(ctx.clear_watch_history());
        assert!(ctx.watch_history().is_empty());
        assert!(ctx.is_favorite("tt1"));
        assert_mirror_matches_store(&ctx);
    }

    #[test]
    fn remove_from_drops_single_entry() {
        let mut ctx = context();
        ctx.toggle_watchlist(&movie("tt1"));
        ctx.toggle_watchlist(&movie("tt2"));

        ctx.remove_from(Collection::Watchlist, "tt1");
        assert_eq!(ctx.watchlist().len(), 1);
        assert_eq!(ctx.watchlist()[0].imdb_id, "tt2");
        assert_mirror_matches_store(&ctx);
    }

    #[test]
    fn toggle_under_full_storage_reports_membership_from_mirror_state() {
        let mut ctx = LibraryContext::new(LibraryStore::new(MemoryStorage::with_quota(40)));
        let big = MovieRecord::new("tt1").with_field("Title", "y".repeat(100));

        assert!(!ctx.toggle_favorite(&big));
        assert!(!ctx.is_favorite("tt1"));
        assert_mirror_matches_store(&ctx);
    }

    #[test]
    fn failed_history_clear_is_reported_and_keeps_entries() {
        let mut ctx = LibraryContext::new(LibraryStore::new(UndeletableStorage(
            MemoryStorage::new(),
        )));
        ctx.add_movie_to_history(&movie("tt1"), 30.0);

        assert!(!ctx.clear_watch_history());
        assert_eq!(ctx.watch_history().len(), 1);
        assert_eq!(ctx.watch_history()[0].imdb_id, "tt1");
    }
}
