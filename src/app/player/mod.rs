mod process;

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::PlayerConfig;
use crate::library::LibraryContext;
use crate::movie::MovieRecord;
use crate::omdb::MovieSource;
use crate::storage::Storage;

use super::format::{format_playback_time, title_with_year};
use self::process::run_player;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaybackOutcome {
    pub(crate) elapsed_secs: f64,
    pub(crate) failure_detail: Option<String>,
}

/// Opens the sample video in the configured external player and blocks
/// until it exits.
pub(crate) fn launch_player(config: &PlayerConfig, movie: &MovieRecord) -> Result<PlaybackOutcome> {
    info!(
        imdb_id = %movie.imdb_id,
        player = %config.command,
        "starting playback"
    );
    let started = Instant::now();
    let status = run_player(config)?;
    let elapsed_secs = started.elapsed().as_secs() as f64;

    let failure_detail = (!status.success()).then(|| match status.code() {
        Some(code) => format!("player exited with status {code}"),
        None => "player terminated by signal".to_string(),
    });
    Ok(PlaybackOutcome {
        elapsed_secs,
        failure_detail,
    })
}

/// Looks the movie up, plays it, and records the watched offset.
///
/// History is only written when some time actually elapsed.
pub(crate) fn play_movie<S, M, F>(
    source: &M,
    ctx: &mut LibraryContext<S>,
    config: &PlayerConfig,
    imdb_id: &str,
    launch: F,
) -> Result<String>
where
    S: Storage,
    M: MovieSource,
    F: FnOnce(&PlayerConfig, &MovieRecord) -> Result<PlaybackOutcome>,
{
    let movie = source
        .details(imdb_id)
        .with_context(|| format!("failed to load movie {imdb_id}"))?;

    let outcome = match launch(config, &movie) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(imdb_id, error = %err, "player launch failed");
            return Ok(format!(
                "Player launch failed: {err:#}. Watch history not updated."
            ));
        }
    };

    let title = title_with_year(&movie);
    if outcome.elapsed_secs <= 0.0 {
        return Ok(format!("Playback of {title} ended immediately. Watch history not updated."));
    }

    ctx.add_movie_to_history(&movie, outcome.elapsed_secs);
    let watched = format_playback_time(outcome.elapsed_secs);
    Ok(match outcome.failure_detail {
        Some(detail) => format!("Recorded {title} at {watched} ({detail})."),
        None => format!("Recorded {title} at {watched}."),
    })
}
