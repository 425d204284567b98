mod context;
mod search_history;
mod store;

pub use context::LibraryContext;
pub use search_history::SearchHistory;
pub use store::{LibraryStore, WATCH_HISTORY_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Favorites,
    Watchlist,
    WatchHistory,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Favorites,
        Collection::Watchlist,
        Collection::WatchHistory,
    ];

    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Favorites => "reelshelf_favorites",
            Self::Watchlist => "reelshelf_watchlist",
            Self::WatchHistory => "reelshelf_watch_history",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Favorites => "Favorites",
            Self::Watchlist => "Watchlist",
            Self::WatchHistory => "History",
        }
    }
}

/// The collections that take plain membership adds (no playback offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    Favorites,
    Watchlist,
}

impl From<Shelf> for Collection {
    fn from(shelf: Shelf) -> Self {
        match shelf {
            Shelf::Favorites => Collection::Favorites,
            Shelf::Watchlist => Collection::Watchlist,
        }
    }
}
