use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Padding, Paragraph, Row, Table, Wrap,
};

use crate::library::{Collection, LibraryContext, SearchHistory};
use crate::movie::MovieRecord;
use crate::storage::Storage;

use super::super::NAV_RECENT_SEARCHES;
use super::super::format::{
    format_playback_time, format_timestamp_display, membership_badges, truncate, value_or_dash,
};
use super::actions::tab_items;
use super::{DetailsState, PendingConfirm, Tab, ViewState};

pub(super) fn draw_tui<S: Storage>(
    frame: &mut Frame,
    ctx: &LibraryContext<S>,
    view: &mut ViewState,
    status: &str,
    pending_confirm: Option<&PendingConfirm>,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "REELSHELF",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!(
                "♥ {}   + {}   watched {}",
                ctx.favorites().len(),
                ctx.watchlist().len(),
                ctx.watch_history().len()
            ),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(view.tab.label(), Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Library"));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    let items = tab_items(ctx, view.tab, &view.search_results);
    if items.is_empty() {
        let empty = Paragraph::new(empty_tab_text(ctx, view))
            .style(Style::default().fg(Color::Rgb(185, 195, 210)))
            .wrap(Wrap { trim: true })
            .block(panel_block(list_title(view.tab)));
        frame.render_widget(empty, body_chunks[0]);
    } else {
        let table = movie_table(ctx, view.tab, items);
        frame.render_stateful_widget(table, body_chunks[0], &mut view.table_state);
    }

    let selected = Paragraph::new(details_text(view))
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: false })
        .block(panel_block("Selected"));
    frame.render_widget(selected, body_chunks[1]);

    let command_bar = Paragraph::new(tab_selector_line(view.tab))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(input) = view.search_input.as_deref() {
        let popup_text = format!("Search movies\n\n> {input}_\n\n[Enter] Search   [Esc] Cancel");
        render_popup(frame, &popup_text, "Search");
    } else if let Some(confirm) = pending_confirm {
        let popup_text = match confirm {
            PendingConfirm::Remove {
                collection, title, ..
            } => format!(
                "Remove from {}?\n\n{title}\n\n[y / Enter] Remove   [n / Esc] Cancel",
                collection.label()
            ),
            PendingConfirm::ClearHistory => format!(
                "Clear watch history?\n\n{} entries will be removed.\n\nThis cannot be undone.\n\n[y / Enter] Clear   [n / Esc] Cancel",
                ctx.watch_history().len()
            ),
        };
        render_popup(frame, &popup_text, "Confirm");
    }
}

fn list_title(tab: Tab) -> &'static str {
    match tab {
        Tab::Favorites => "Favorites",
        Tab::Watchlist => "Watchlist",
        Tab::History => "Watch History",
        Tab::Search => "Search Results",
    }
}

fn empty_tab_text<S: Storage>(ctx: &LibraryContext<S>, view: &ViewState) -> String {
    match view.tab {
        Tab::Favorites => "You haven't added any favorites yet.\n\nSearch with / and press f on a movie.".to_string(),
        Tab::Watchlist => "Your watchlist is empty.\n\nSearch with / and press w on a movie.".to_string(),
        Tab::History => "Nothing watched yet.\n\nPress Enter on a movie to play it.".to_string(),
        Tab::Search if view.search_loading => format!("Searching for \"{}\"...", view.search_query),
        Tab::Search => {
            let recent = SearchHistory::new(ctx.store().storage()).recent(NAV_RECENT_SEARCHES);
            let mut text = if view.search_query.is_empty() {
                "Press / to search.".to_string()
            } else {
                format!("No movies found for \"{}\".", view.search_query)
            };
            if !recent.is_empty() {
                text.push_str("\n\nRecent searches");
                for entry in recent {
                    text.push_str("\n  ");
                    text.push_str(&entry.query);
                }
            }
            text
        }
    }
}

fn movie_table<'a, S: Storage>(
    ctx: &LibraryContext<S>,
    tab: Tab,
    items: &'a [MovieRecord],
) -> Table<'a> {
    let history = tab == Tab::History;
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let when = if history {
                item.watched_date.as_deref()
            } else {
                item.added_date.as_deref()
            };
            let last_column = if history {
                item.duration
                    .map(format_playback_time)
                    .unwrap_or_else(|| "-".to_string())
            } else {
                value_or_dash(item.kind()).to_string()
            };
            Row::new(vec![
                Cell::from(membership_badges(
                    ctx.is_favorite(&item.imdb_id),
                    ctx.is_in_watchlist(&item.imdb_id),
                )),
                Cell::from(item.display_title().to_string()),
                Cell::from(value_or_dash(item.year()).to_string()),
                Cell::from(
                    when.map(format_timestamp_display)
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(last_column),
            ])
        })
        .collect();

    let header = if history {
        ["", "Title", "Year", "Watched", "At"]
    } else {
        ["", "Title", "Year", "Added", "Type"]
    };
    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Percentage(44),
            Constraint::Length(10),
            Constraint::Length(17),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(header.to_vec()).style(
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(panel_block(list_title(tab)))
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(110, 170, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ")
}

fn details_text(view: &ViewState) -> String {
    let Some(details) = view.details.as_ref() else {
        return "Nothing selected.".to_string();
    };
    match &details.state {
        DetailsState::Loading => format!("{}\n\nLoading details...", details.imdb_id),
        DetailsState::Failed(err) => format!("{}\n\nFailed to load details.\n{err}", details.imdb_id),
        DetailsState::Ready(movie) => {
            let mut text = format!(
                "Title\n{}\n\nYear / Type\n{} / {}\n\nRating\n{}\n\nRuntime\n{}\n\nGenre\n{}\n\nDirector\n{}",
                truncate(movie.display_title(), 40),
                value_or_dash(movie.year()),
                value_or_dash(movie.kind()),
                value_or_dash(movie.imdb_rating()),
                value_or_dash(movie.runtime()),
                truncate(value_or_dash(movie.genre()), 40),
                truncate(value_or_dash(movie.director()), 40),
            );
            if let Some(plot) = movie.plot() {
                text.push_str("\n\nPlot\n");
                text.push_str(plot);
            }
            text
        }
    }
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn tab_pill_style(tab: Tab, current: Tab) -> Style {
    if tab == current {
        Style::default()
            .bg(Color::Rgb(110, 170, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(Color::Rgb(72, 82, 96))
            .fg(Color::Rgb(230, 235, 242))
    }
}

fn tab_selector_line(current: Tab) -> Line<'static> {
    let mut spans = Vec::new();
    for tab in Tab::ALL {
        spans.push(Span::styled(
            format!(" {} ", tab.label()),
            tab_pill_style(tab, current),
        ));
        spans.push(Span::styled(" ", Style::default()));
    }
    let hints = match current.collection() {
        Some(Collection::WatchHistory) => "  Enter play  f/w toggle  d remove  c clear  / search  q quit",
        Some(_) => "  Enter play  f/w toggle  d remove  / search  q quit",
        None => "  Enter play  f/w toggle  / search  q quit",
    };
    spans.push(Span::styled(
        hints,
        Style::default().fg(Color::Rgb(185, 195, 210)),
    ));
    Line::from(spans)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

fn render_popup(frame: &mut Frame, text: &str, title: &'static str) {
    let popup_area = popup_rect_for_text(frame.area(), text);
    render_popup_shadow(frame, popup_area);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(modal_block(title));
    frame.render_widget(popup, popup_area);
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24))),
        shadow,
    );
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let widest = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let width = widest
        .saturating_add(12)
        .clamp(44.min(available_width), 72.min(available_width));
    let available_height = area.height.saturating_sub(2).max(1);
    let height = line_count
        .saturating_add(6)
        .clamp(9.min(available_height), 18.min(available_height));

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}
