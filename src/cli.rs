use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::filters::{RatingBand, SearchFilters};
use crate::library::Collection;

#[derive(Debug, Parser)]
#[command(
    name = "reelshelf",
    version,
    about = "Browse movies and keep favorites, a watchlist and watch history"
)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the categorized home feed
    Home,
    /// Search by title
    Search(SearchArgs),
    /// Show full details for a movie
    Details { imdb_id: String },
    /// Play the sample video for a movie and record it in watch history
    Play { imdb_id: String },
    /// Add or remove a movie from favorites
    Favorite { imdb_id: String },
    /// Add or remove a movie from the watchlist
    Watchlist { imdb_id: String },
    /// List library contents
    Library {
        #[arg(long, value_enum, default_value_t = LibraryTab::Favorites)]
        tab: LibraryTab,
    },
    /// Show or clear watch history
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Show recent searches
    Recent,
    /// Delete favorites, watchlist and watch history
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Open the interactive browser (the default with no subcommand)
    Tui,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, value_enum)]
    pub rating: Option<RatingArg>,

    /// Exact OMDb type: movie, series or episode
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

impl SearchArgs {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            year: self.year,
            rating: self.rating.map(RatingBand::from),
            kind: self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RatingArg {
    High,
    Medium,
    Low,
}

impl From<RatingArg> for RatingBand {
    fn from(arg: RatingArg) -> Self {
        match arg {
            RatingArg::High => RatingBand::High,
            RatingArg::Medium => RatingBand::Medium,
            RatingArg::Low => RatingBand::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LibraryTab {
    Favorites,
    Watchlist,
    History,
}

impl From<LibraryTab> for Collection {
    fn from(tab: LibraryTab) -> Self {
        match tab {
            LibraryTab::Favorites => Collection::Favorites,
            LibraryTab::Watchlist => Collection::Watchlist,
            LibraryTab::History => Collection::WatchHistory,
        }
    }
}
