mod format;
mod player;
mod tui;


use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{Cli, Command, SearchArgs};
use crate::config::{Config, FeedRow};
use crate::db::Database;
use crate::filters::SearchFilters;
use crate::library::{
    Collection, LibraryContext, LibraryStore, SearchHistory, Shelf, WATCH_HISTORY_LIMIT,
};
use crate::logging::{LogTarget, init_logging};
use crate::movie::MovieRecord;
use crate::omdb::{MetadataError, MovieSource, OmdbClient, home_feed};
use crate::paths::{config_file_path, database_file_path, log_file_path};
use crate::storage::{MemoryStorage, Storage};

use self::format::{
    format_playback_time, format_timestamp_display, membership_badges, title_with_year, truncate,
    value_or_dash,
};
use self::player::{launch_player, play_movie};

const NAV_RECENT_SEARCHES: usize = 5;

pub fn run(cli: Cli) -> Result<()> {
    let tui_mode = matches!(cli.command, Some(Command::Tui) | None);
    let log_path = log_file_path()?;
    let log_target = if tui_mode {
        LogTarget::File(&log_path)
    } else {
        LogTarget::Stderr
    };
    init_logging(cli.verbose, cli.quiet, log_target)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path()?,
    };
    let config = Config::load(&config_path)?;
    let source = OmdbClient::new(&config.omdb);
    let command = cli.command.unwrap_or(Command::Tui);

    match open_db() {
        Ok(db) => dispatch(command, &source, &config, LibraryStore::new(db)),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "library database unavailable");
            if !tui_mode {
                eprintln!("WARNING: library database unavailable, changes will not be saved.");
            }
            dispatch(
                command,
                &source,
                &config,
                LibraryStore::new(MemoryStorage::new()),
            )
        }
    }
}

fn dispatch<S: Storage>(
    command: Command,
    source: &OmdbClient,
    config: &Config,
    store: LibraryStore<S>,
) -> Result<()> {
    let mut ctx = LibraryContext::new(store);

    match command {
        Command::Home => run_home(source, &ctx, &config.feed),
        Command::Search(args) => run_search(source, &ctx, &args),
        Command::Details { imdb_id } => run_details(source, &ctx, &imdb_id),
        Command::Play { imdb_id } => {
            match play_movie(source, &mut ctx, &config.player, &imdb_id, launch_player) {
                Ok(message) => println!("{message}"),
                Err(err) => println!("Failed to load movie: {err:#}"),
            }
        }
        Command::Favorite { imdb_id } => run_toggle(source, &mut ctx, Shelf::Favorites, &imdb_id),
        Command::Watchlist { imdb_id } => run_toggle(source, &mut ctx, Shelf::Watchlist, &imdb_id),
        Command::Library { tab } => run_library(&ctx, tab.into()),
        Command::History { clear } => run_history(&mut ctx, clear),
        Command::Recent => run_recent(&ctx),
        Command::Reset { yes } => run_reset(&mut ctx, yes),
        Command::Tui => tui::run_tui(source, &mut ctx, config)?,
    }

    Ok(())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()
        .with_context(|| format!("failed to migrate database at {}", db_path.display()))?;
    info!(path = %db_path.display(), "library database ready");
    Ok(db)
}

fn run_home<S: Storage, M: MovieSource + Sync>(
    source: &M,
    ctx: &LibraryContext<S>,
    rows: &[FeedRow],
) {
    let recent = SearchHistory::new(ctx.store().storage()).recent(NAV_RECENT_SEARCHES);
    if !recent.is_empty() {
        let queries: Vec<_> = recent.iter().map(|entry| entry.query.as_str()).collect();
        println!("Recent searches: {}\n", queries.join(", "));
    }

    let sections = home_feed(source, rows);
    if sections.is_empty() {
        println!("Nothing to show right now. Check your connection and try again.");
        return;
    }
    for section in sections {
        println!("== {} ==", section.title);
        print_movie_rows(ctx, &section.movies);
        println!();
    }
}

/// Runs a search, narrows it, and remembers the query when anything matched.
pub(crate) fn search_and_record<S: Storage, M: MovieSource>(
    source: &M,
    storage: &S,
    query: &str,
    filters: &SearchFilters,
) -> Result<Vec<MovieRecord>, MetadataError> {
    let results = filters.apply(source.search(query)?);
    if !results.is_empty() {
        SearchHistory::new(storage).record(query.trim());
    }
    Ok(results)
}

fn run_search<S: Storage, M: MovieSource>(source: &M, ctx: &LibraryContext<S>, args: &SearchArgs) {
    let filters = args.filters();
    let results = match search_and_record(source, ctx.store().storage(), &args.query, &filters) {
        Ok(results) => results,
        Err(err) => {
            warn!(query = %args.query, error = %err, "search failed");
            println!("Error searching movies. Please try again. ({err})");
            return;
        }
    };

    if results.is_empty() {
        println!("No movies found for \"{}\".", args.query.trim());
        return;
    }
    println!("{} result(s) for \"{}\"", results.len(), args.query.trim());
    print_movie_rows(ctx, &results);
}

fn print_movie_rows<S: Storage>(ctx: &LibraryContext<S>, movies: &[MovieRecord]) {
    println!("{:<3} {:<12} {:<44} {:<10} {:<8}", "", "IMDB ID", "TITLE", "YEAR", "TYPE");
    for movie in movies {
        println!(
            "{:<3} {:<12} {:<44} {:<10} {:<8}",
            membership_badges(
                ctx.is_favorite(&movie.imdb_id),
                ctx.is_in_watchlist(&movie.imdb_id)
            ),
            truncate(&movie.imdb_id, 12),
            truncate(movie.display_title(), 44),
            value_or_dash(movie.year()),
            value_or_dash(movie.kind()),
        );
    }
}

fn run_details<S: Storage, M: MovieSource>(source: &M, ctx: &LibraryContext<S>, imdb_id: &str) {
    let movie = match source.details(imdb_id) {
        Ok(movie) => movie,
        Err(MetadataError::NotFound { .. }) => {
            println!("Movie not found: {imdb_id}");
            return;
        }
        Err(err) => {
            println!("Failed to load movie details: {err}");
            return;
        }
    };

    println!("{}", title_with_year(&movie));
    println!("  IMDB ID:   {}", movie.imdb_id);
    println!("  Type:      {}", value_or_dash(movie.kind()));
    println!("  Rating:    {}", value_or_dash(movie.imdb_rating()));
    println!("  Runtime:   {}", value_or_dash(movie.runtime()));
    println!("  Genre:     {}", value_or_dash(movie.genre()));
    println!("  Director:  {}", value_or_dash(movie.director()));
    println!("  Cast:      {}", value_or_dash(movie.actors()));
    println!("  Poster:    {}", value_or_dash(movie.poster()));
    println!(
        "  Library:   {}{}",
        if ctx.is_favorite(&movie.imdb_id) {
            "favorite "
        } else {
            ""
        },
        if ctx.is_in_watchlist(&movie.imdb_id) {
            "watchlist"
        } else {
            ""
        }
    );
    if let Some(plot) = movie.plot() {
        println!("\n{plot}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Toggled {
    Added,
    Removed,
    /// The write was rejected; membership is what it was before.
    Unchanged,
}

/// Flips membership of `imdb_id` on `shelf`.
///
/// The record to store comes from the shelf itself when removing, otherwise
/// from `prefetched` when it matches, and only then from a details lookup,
/// so the library keeps the full record the API returned.
pub(crate) fn toggle_membership<S: Storage, M: MovieSource>(
    source: &M,
    ctx: &mut LibraryContext<S>,
    shelf: Shelf,
    imdb_id: &str,
    prefetched: Option<&MovieRecord>,
) -> Result<(MovieRecord, Toggled), MetadataError> {
    let collection = Collection::from(shelf);
    let stored = ctx
        .collection(collection)
        .iter()
        .find(|entry| entry.imdb_id == imdb_id)
        .cloned();
    let was_member = stored.is_some();
    let movie = match (stored, prefetched) {
        (Some(movie), _) => movie,
        (None, Some(movie)) if movie.imdb_id == imdb_id => movie.clone(),
        (None, _) => source.details(imdb_id)?,
    };
    let member = match shelf {
        Shelf::Favorites => ctx.toggle_favorite(&movie),
        Shelf::Watchlist => ctx.toggle_watchlist(&movie),
    };
    let toggled = match (was_member, member) {
        (false, true) => Toggled::Added,
        (true, false) => Toggled::Removed,
        _ => Toggled::Unchanged,
    };
    Ok((movie, toggled))
}

pub(crate) fn toggle_message(shelf: Shelf, movie: &MovieRecord, toggled: Toggled) -> String {
    let label = Collection::from(shelf).label();
    let title = title_with_year(movie);
    match toggled {
        Toggled::Added => format!("Added {title} to {label}."),
        Toggled::Removed => format!("Removed {title} from {label}."),
        Toggled::Unchanged => format!("Could not update {label} for {title}; see the log."),
    }
}

fn run_toggle<S: Storage, M: MovieSource>(
    source: &M,
    ctx: &mut LibraryContext<S>,
    shelf: Shelf,
    imdb_id: &str,
) {
    match toggle_membership(source, ctx, shelf, imdb_id, None) {
        Ok((movie, toggled)) => println!("{}", toggle_message(shelf, &movie, toggled)),
        Err(err) => println!(
            "Could not update {}: {err}",
            Collection::from(shelf).label()
        ),
    }
}

fn run_library<S: Storage>(ctx: &LibraryContext<S>, collection: Collection) {
    let items = ctx.collection(collection);
    match collection {
        Collection::WatchHistory => println!(
            "{} ({}/{WATCH_HISTORY_LIMIT})",
            collection.label(),
            items.len()
        ),
        _ => println!("{} ({})", collection.label(), items.len()),
    }
    if items.is_empty() {
        match collection {
            Collection::Favorites => println!("You haven't added any favorites yet."),
            Collection::Watchlist => println!("Your watchlist is empty."),
            Collection::WatchHistory => println!("Nothing watched yet."),
        }
        return;
    }

    let when_header = match collection {
        Collection::WatchHistory => "WATCHED",
        _ => "ADDED",
    };
    println!(
        "{:<12} {:<44} {:<10} {:<18} {:<9}",
        "IMDB ID", "TITLE", "YEAR", when_header, "AT"
    );
    for item in items {
        let when = match collection {
            Collection::WatchHistory => item.watched_date.as_deref(),
            _ => item.added_date.as_deref(),
        };
        println!(
            "{:<12} {:<44} {:<10} {:<18} {:<9}",
            truncate(&item.imdb_id, 12),
            truncate(item.display_title(), 44),
            value_or_dash(item.year()),
            when.map(format_timestamp_display)
                .unwrap_or_else(|| "-".to_string()),
            item.duration
                .map(format_playback_time)
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

fn run_history<S: Storage>(ctx: &mut LibraryContext<S>, clear: bool) {
    if clear {
        let removed = ctx.watch_history().len();
        if ctx.clear_watch_history() {
            println!(
                "Cleared {removed} watch history entr{}.",
                if removed == 1 { "y" } else { "ies" }
            );
        } else {
            println!("Clearing watch history failed; see the log for details.");
        }
        return;
    }
    run_library(ctx, Collection::WatchHistory);
}

fn run_recent<S: Storage>(ctx: &LibraryContext<S>) {
    let entries = SearchHistory::new(ctx.store().storage()).entries();
    if entries.is_empty() {
        println!("No recent searches.");
        return;
    }
    for entry in entries {
        println!(
            "{:<18} {}",
            format_timestamp_display(&entry.timestamp),
            entry.query
        );
    }
}

fn run_reset<S: Storage>(ctx: &mut LibraryContext<S>, confirmed: bool) {
    if !confirmed {
        println!("This deletes favorites, watchlist and watch history. Re-run with --yes to confirm.");
        return;
    }
    if ctx.clear_all() {
        println!("Library reset.");
    } else {
        println!("Library reset incomplete; see the log for details.");
    }
}
