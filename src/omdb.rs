use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{FeedRow, OmdbConfig};
use crate::http::{FetchError, HttpOptions, get_text_with_retries};
use crate::movie::MovieRecord;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("network request failed: {0}")]
    Network(#[from] FetchError),
    #[error("unexpected response from movie API: {0}")]
    Parse(String),
    #[error("no movie found for {imdb_id}: {message}")]
    NotFound { imdb_id: String, message: String },
}

/// Where movie metadata comes from. Every call is a fresh, uncached lookup.
pub trait MovieSource {
    fn search(&self, query: &str) -> Result<Vec<MovieRecord>, MetadataError>;
    fn details(&self, imdb_id: &str) -> Result<MovieRecord, MetadataError>;

    fn category(&self, term: &str) -> Result<Vec<MovieRecord>, MetadataError> {
        self.search(term)
    }
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    base_url: String,
    api_key: String,
    http: HttpOptions,
}

impl OmdbClient {
    pub fn new(config: &OmdbConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            http: config.http_options(),
        }
    }
}

impl MovieSource for OmdbClient {
    fn search(&self, query: &str) -> Result<Vec<MovieRecord>, MetadataError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        debug!(query, "searching movies");
        let raw = get_text_with_retries(
            &self.base_url,
            &[
                ("s", query),
                ("apikey", self.api_key.as_str()),
                ("page", "1"),
                ("type", "movie"),
            ],
            &self.http,
        )?;
        parse_search_response(&raw)
    }

    fn details(&self, imdb_id: &str) -> Result<MovieRecord, MetadataError> {
        debug!(imdb_id, "fetching movie details");
        let raw = get_text_with_retries(
            &self.base_url,
            &[
                ("i", imdb_id.trim()),
                ("apikey", self.api_key.as_str()),
                ("type", "movie"),
                ("plot", "full"),
            ],
            &self.http,
        )?;
        parse_details_response(imdb_id, &raw)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<MovieRecord>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

pub(crate) fn parse_search_response(raw: &str) -> Result<Vec<MovieRecord>, MetadataError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(raw).map_err(|err| MetadataError::Parse(err.to_string()))?;
    if envelope.response.eq_ignore_ascii_case("true") {
        return Ok(envelope.search);
    }
    debug!(error = ?envelope.error, "search returned no results");
    Ok(Vec::new())
}

pub(crate) fn parse_details_response(
    imdb_id: &str,
    raw: &str,
) -> Result<MovieRecord, MetadataError> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|err| MetadataError::Parse(err.to_string()))?;
    let found = value
        .get("Response")
        .and_then(Value::as_str)
        .is_some_and(|response| response.eq_ignore_ascii_case("true"));
    if !found {
        let message = value
            .get("Error")
            .and_then(Value::as_str)
            .unwrap_or("Movie not found")
            .to_string();
        return Err(MetadataError::NotFound {
            imdb_id: imdb_id.to_string(),
            message,
        });
    }

    if let Some(object) = value.as_object_mut() {
        object.remove("Response");
    }
    serde_json::from_value(value).map_err(|err| MetadataError::Parse(err.to_string()))
}

#[derive(Debug, Clone)]
pub struct FeedSection {
    pub title: String,
    pub movies: Vec<MovieRecord>,
}

/// Fills every home-feed row with its own concurrent lookup.
///
/// Rows that fail or come back empty are dropped; the rest keep the
/// configured order.
pub fn home_feed<M>(source: &M, rows: &[FeedRow]) -> Vec<FeedSection>
where
    M: MovieSource + Sync,
{
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = rows
            .iter()
            .map(|row| scope.spawn(move || source.category(&row.query)))
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    rows.iter()
        .zip(results)
        .filter_map(|(row, joined)| match joined {
            Ok(Ok(movies)) if !movies.is_empty() => Some(FeedSection {
                title: row.name.clone(),
                movies,
            }),
            Ok(Ok(_)) => None,
            Ok(Err(err)) => {
                warn!(row = %row.name, error = %err, "feed row failed");
                None
            }
            Err(_) => {
                warn!(row = %row.name, "feed row worker panicked");
                None
            }
        })
        .collect()
}
