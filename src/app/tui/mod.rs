mod actions;
mod render;
mod session;

use std::io;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::config::Config;
use crate::library::{Collection, LibraryContext, Shelf};
use crate::movie::MovieRecord;
use crate::omdb::MovieSource;
use crate::storage::Storage;

use super::format::{title_with_year, truncate};
use super::player::{launch_player, play_movie};
use super::{Toggled, toggle_membership, toggle_message};

pub(crate) use self::actions::apply_fetch_result;
use self::actions::{
    drain_fetch_results, ensure_selected_details, refresh_selection, request_search, status_error,
    status_info, tab_items,
};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Favorites,
    Watchlist,
    History,
    Search,
}

impl Tab {
    pub(crate) const ALL: [Tab; 4] = [Tab::Favorites, Tab::Watchlist, Tab::History, Tab::Search];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Favorites => "FAVORITES",
            Self::Watchlist => "WATCHLIST",
            Self::History => "HISTORY",
            Self::Search => "SEARCH",
        }
    }

    pub(crate) fn collection(self) -> Option<Collection> {
        match self {
            Self::Favorites => Some(Collection::Favorites),
            Self::Watchlist => Some(Collection::Watchlist),
            Self::History => Some(Collection::WatchHistory),
            Self::Search => None,
        }
    }

    pub(crate) fn move_left(self) -> Self {
        match self {
            Self::Favorites => Self::Favorites,
            Self::Watchlist => Self::Favorites,
            Self::History => Self::Watchlist,
            Self::Search => Self::History,
        }
    }

    pub(crate) fn move_right(self) -> Self {
        match self {
            Self::Favorites => Self::Watchlist,
            Self::Watchlist => Self::History,
            Self::History => Self::Search,
            Self::Search => Self::Search,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) enum PendingConfirm {
    Remove {
        collection: Collection,
        imdb_id: String,
        title: String,
    },
    ClearHistory,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DetailsState {
    Loading,
    Ready(Box<MovieRecord>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetailsView {
    pub(crate) imdb_id: String,
    pub(crate) state: DetailsState,
}

/// Background work reported back to the event loop. `generation` is the
/// request counter at the time the work was started.
#[derive(Debug)]
pub(crate) enum FetchResult {
    Details {
        generation: u64,
        imdb_id: String,
        outcome: Result<MovieRecord, String>,
    },
    Search {
        generation: u64,
        query: String,
        outcome: Result<Vec<MovieRecord>, String>,
    },
}

#[derive(Debug)]
pub(crate) struct ViewState {
    pub(crate) tab: Tab,
    pub(crate) table_state: TableState,
    pub(crate) search_query: String,
    pub(crate) search_results: Vec<MovieRecord>,
    pub(crate) search_loading: bool,
    pub(crate) search_input: Option<String>,
    pub(crate) details: Option<DetailsView>,
    pub(crate) details_generation: u64,
    pub(crate) search_generation: u64,
}

impl ViewState {
    pub(crate) fn new() -> Self {
        Self {
            tab: Tab::Favorites,
            table_state: TableState::default(),
            search_query: String::new(),
            search_results: Vec::new(),
            search_loading: false,
            search_input: None,
            details: None,
            details_generation: 0,
            search_generation: 0,
        }
    }

    /// The fully loaded details record for `imdb_id`, if the panel holds one.
    pub(crate) fn ready_details(&self, imdb_id: &str) -> Option<&MovieRecord> {
        match self.details.as_ref() {
            Some(DetailsView {
                imdb_id: shown,
                state: DetailsState::Ready(movie),
            }) if shown == imdb_id => Some(movie.as_ref()),
            _ => None,
        }
    }

    /// Switches tab and invalidates any details request for the old one.
    pub(crate) fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        self.tab = tab;
        self.table_state.select(None);
        self.details = None;
        self.details_generation += 1;
    }
}

pub(crate) fn run_tui<S, M>(source: &M, ctx: &mut LibraryContext<S>, config: &Config) -> Result<()>
where
    S: Storage,
    M: MovieSource + Clone + Send + 'static,
{
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut view = ViewState::new();
    let mut pending_confirm = None::<PendingConfirm>;
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchResult>();
    refresh_selection(ctx, &mut view, None);
    let mut status = if ctx.favorites().is_empty() {
        status_info("No favorites yet. Press → to browse tabs or / to search.")
    } else {
        status_info("Ready.")
    };

    loop {
        if let Some(msg) = drain_fetch_results(&fetch_rx, &mut view, ctx.store().storage()) {
            status = msg;
        }
        ensure_selected_details(ctx, &mut view, source, &fetch_tx);
        terminal.draw(|frame| {
            draw_tui(frame, ctx, &mut view, &status, pending_confirm.as_ref())
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(input) = view.search_input.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let query = input.trim().to_string();
                    view.search_input = None;
                    if query.is_empty() {
                        status = status_info("Search canceled.");
                        continue;
                    }
                    view.switch_tab(Tab::Search);
                    request_search(source, &query, &mut view, &fetch_tx);
                    status = status_info(&format!("Searching for \"{query}\"..."));
                }
                KeyCode::Esc => {
                    view.search_input = None;
                    status = status_info("Search canceled.");
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(ch) => input.push(ch),
                _ => {}
            }
            continue;
        }

        if let Some(confirm) = pending_confirm.as_ref() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    match confirm {
                        PendingConfirm::Remove {
                            collection,
                            imdb_id,
                            title,
                        } => {
                            ctx.remove_from(*collection, imdb_id);
                            status = if ctx.store().contains(*collection, imdb_id) {
                                status_error(&format!("Remove failed for {title}."))
                            } else {
                                status_info(&format!(
                                    "Removed {title} from {}.",
                                    collection.label()
                                ))
                            };
                        }
                        PendingConfirm::ClearHistory => {
                            status = if ctx.clear_watch_history() {
                                status_info("Watch history cleared.")
                            } else {
                                status_error("Clearing watch history failed.")
                            };
                        }
                    }
                    pending_confirm = None;
                    refresh_selection(ctx, &mut view, None);
                }
                KeyCode::Esc | KeyCode::Char('n') => {
                    pending_confirm = None;
                    status = status_info("Canceled.");
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Char('/') | KeyCode::Char('s') => {
                view.search_input = Some(String::new());
                status = status_info("Type a title and press Enter. Esc cancels.");
            }
            KeyCode::Left => {
                view.switch_tab(view.tab.move_left());
                refresh_selection(ctx, &mut view, None);
            }
            KeyCode::Right => {
                view.switch_tab(view.tab.move_right());
                refresh_selection(ctx, &mut view, None);
            }
            KeyCode::Up => {
                if let Some(selected) = view.table_state.selected() {
                    view.table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down => {
                let len = tab_items(ctx, view.tab, &view.search_results).len();
                if let Some(selected) = view.table_state.selected()
                    && len > 0
                {
                    view.table_state.select(Some((selected + 1).min(len - 1)));
                }
            }
            KeyCode::Char('f') | KeyCode::Char('w') => {
                let shelf = if key.code == KeyCode::Char('f') {
                    Shelf::Favorites
                } else {
                    Shelf::Watchlist
                };
                let Some(movie) = selected_movie(ctx, &view) else {
                    status = status_error("No movie selected.");
                    continue;
                };
                let prefetched = view.ready_details(&movie.imdb_id).cloned();
                status = match toggle_membership(
                    source,
                    ctx,
                    shelf,
                    &movie.imdb_id,
                    prefetched.as_ref(),
                ) {
                    Ok((movie, Toggled::Unchanged)) => {
                        status_error(&toggle_message(shelf, &movie, Toggled::Unchanged))
                    }
                    Ok((movie, toggled)) => status_info(&toggle_message(shelf, &movie, toggled)),
                    Err(err) => status_error(&format!(
                        "Could not update {}: {err}",
                        Collection::from(shelf).label()
                    )),
                };
                refresh_selection(ctx, &mut view, Some(&movie.imdb_id));
            }
            KeyCode::Char('d') => {
                let Some(collection) = view.tab.collection() else {
                    status = status_error("Search results cannot be deleted.");
                    continue;
                };
                let Some(movie) = selected_movie(ctx, &view) else {
                    status = status_error("Delete failed: no entry selected.");
                    continue;
                };
                pending_confirm = Some(PendingConfirm::Remove {
                    collection,
                    imdb_id: movie.imdb_id.clone(),
                    title: truncate(&title_with_year(&movie), 56),
                });
                status = status_info("Confirm: y/Enter to remove, n/Esc to cancel.");
            }
            KeyCode::Char('c') => {
                if ctx.watch_history().is_empty() {
                    status = status_info("Watch history is already empty.");
                    continue;
                }
                pending_confirm = Some(PendingConfirm::ClearHistory);
                status = status_info("Confirm: y/Enter to clear history, n/Esc to cancel.");
            }
            KeyCode::Enter => {
                let Some(movie) = selected_movie(ctx, &view) else {
                    continue;
                };

                let result = session.handed_off(|| {
                    play_movie(source, ctx, &config.player, &movie.imdb_id, launch_player)
                })?;
                terminal.clear()?;

                status = match result {
                    Ok(msg) => status_info(&msg),
                    Err(err) => status_error(&format!("Playback failed: {err:#}")),
                };
                refresh_selection(ctx, &mut view, Some(&movie.imdb_id));
            }
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}

fn selected_movie<S: Storage>(ctx: &LibraryContext<S>, view: &ViewState) -> Option<MovieRecord> {
    let idx = view.table_state.selected()?;
    tab_items(ctx, view.tab, &view.search_results)
        .get(idx)
        .cloned()
}
