use chrono::{DateTime, Local};

use crate::movie::MovieRecord;

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_timestamp_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Playback offset as `m:ss`, or `h:mm:ss` from one hour up.
pub(crate) fn format_playback_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub(crate) fn title_with_year(movie: &MovieRecord) -> String {
    match movie.year() {
        Some(year) => format!("{} ({year})", movie.display_title()),
        None => movie.display_title().to_string(),
    }
}

pub(crate) fn membership_badges(favorite: bool, watchlist: bool) -> String {
    let mut badges = String::new();
    badges.push(if favorite { '♥' } else { ' ' });
    badges.push(if watchlist { '+' } else { ' ' });
    badges
}

pub(crate) fn value_or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
