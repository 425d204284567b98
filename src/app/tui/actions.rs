use std::sync::mpsc;

use tracing::{debug, warn};

use crate::library::{LibraryContext, SearchHistory};
use crate::movie::MovieRecord;
use crate::omdb::MovieSource;
use crate::storage::Storage;

use super::{DetailsState, DetailsView, FetchResult, Tab, ViewState};

pub(super) fn tab_items<'a, S: Storage>(
    ctx: &'a LibraryContext<S>,
    tab: Tab,
    search_results: &'a [MovieRecord],
) -> &'a [MovieRecord] {
    match tab.collection() {
        Some(collection) => ctx.collection(collection),
        None => search_results,
    }
}

/// Keeps the table selection valid after the visible list changed,
/// preferring the row holding `preferred_id` when it is still present.
pub(super) fn refresh_selection<S: Storage>(
    ctx: &LibraryContext<S>,
    view: &mut ViewState,
    preferred_id: Option<&str>,
) {
    let items = tab_items(ctx, view.tab, &view.search_results);
    let len = items.len();
    let preferred = preferred_id.and_then(|id| items.iter().position(|item| item.imdb_id == id));

    if len == 0 {
        view.table_state.select(None);
        return;
    }
    if let Some(idx) = preferred {
        view.table_state.select(Some(idx));
        return;
    }
    match view.table_state.selected() {
        Some(selected) => view.table_state.select(Some(selected.min(len - 1))),
        None => view.table_state.select(Some(0)),
    }
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

/// Points the details panel at the selected row. Library rows already carry
/// their full record; search rows are looked up in the background.
pub(super) fn ensure_selected_details<S, M>(
    ctx: &LibraryContext<S>,
    view: &mut ViewState,
    source: &M,
    tx: &mpsc::Sender<FetchResult>,
) where
    S: Storage,
    M: MovieSource + Clone + Send + 'static,
{
    let selected = view
        .table_state
        .selected()
        .and_then(|idx| tab_items(ctx, view.tab, &view.search_results).get(idx))
        .cloned();
    let Some(movie) = selected else {
        if view.details.is_some() {
            view.details = None;
            view.details_generation += 1;
        }
        return;
    };
    if view
        .details
        .as_ref()
        .is_some_and(|details| details.imdb_id == movie.imdb_id)
    {
        return;
    }

    view.details_generation += 1;
    if view.tab.collection().is_some() {
        view.details = Some(DetailsView {
            imdb_id: movie.imdb_id.clone(),
            state: DetailsState::Ready(Box::new(movie)),
        });
        return;
    }

    view.details = Some(DetailsView {
        imdb_id: movie.imdb_id.clone(),
        state: DetailsState::Loading,
    });
    let generation = view.details_generation;
    let imdb_id = movie.imdb_id;
    let source = source.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let outcome = source.details(&imdb_id).map_err(|err| err.to_string());
        let _ = tx.send(FetchResult::Details {
            generation,
            imdb_id,
            outcome,
        });
    });
}

pub(super) fn request_search<M>(
    source: &M,
    query: &str,
    view: &mut ViewState,
    tx: &mpsc::Sender<FetchResult>,
) where
    M: MovieSource + Clone + Send + 'static,
{
    view.search_generation += 1;
    view.search_loading = true;
    view.search_query = query.to_string();

    let generation = view.search_generation;
    let query = query.to_string();
    let source = source.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let outcome = source.search(&query).map_err(|err| err.to_string());
        let _ = tx.send(FetchResult::Search {
            generation,
            query,
            outcome,
        });
    });
}

/// Applies one background result to the view. Results from a superseded
/// request are dropped. Returns a status line when the user should be told.
pub(crate) fn apply_fetch_result<S: Storage>(
    view: &mut ViewState,
    result: FetchResult,
    storage: &S,
) -> Option<String> {
    match result {
        FetchResult::Details {
            generation,
            imdb_id,
            outcome,
        } => {
            if generation != view.details_generation {
                debug!(imdb_id = %imdb_id, generation, "discarding stale details result");
                return None;
            }
            let details = view.details.as_mut()?;
            if details.imdb_id != imdb_id {
                return None;
            }
            details.state = match outcome {
                Ok(movie) => DetailsState::Ready(Box::new(movie)),
                Err(err) => DetailsState::Failed(err),
            };
            None
        }
        FetchResult::Search {
            generation,
            query,
            outcome,
        } => {
            if generation != view.search_generation {
                debug!(query = %query, generation, "discarding stale search result");
                return None;
            }
            view.search_loading = false;
            match outcome {
                Ok(results) => {
                    if !results.is_empty() {
                        SearchHistory::new(storage).record(&query);
                    }
                    let count = results.len();
                    view.search_results = results;
                    view.table_state.select((count > 0).then_some(0));
                    view.details = None;
                    view.details_generation += 1;
                    Some(if count == 0 {
                        status_info(&format!("No movies found for \"{query}\"."))
                    } else {
                        status_info(&format!("{count} result(s) for \"{query}\"."))
                    })
                }
                Err(err) => {
                    warn!(query = %query, error = %err, "search failed");
                    Some(status_error("Error searching movies. Please try again."))
                }
            }
        }
    }
}

pub(super) fn drain_fetch_results<S: Storage>(
    rx: &mpsc::Receiver<FetchResult>,
    view: &mut ViewState,
    storage: &S,
) -> Option<String> {
    let mut latest = None;
    while let Ok(result) = rx.try_recv() {
        if let Some(msg) = apply_fetch_result(view, result, storage) {
            latest = Some(msg);
        }
    }
    latest
}
