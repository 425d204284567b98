use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::http::HttpOptions;

pub const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com/";
pub const DEFAULT_OMDB_API_KEY: &str = "ee51dca";
pub const DEFAULT_SAMPLE_URL: &str = "https://commondatastorage.googleapis.com/gtv-videos-library/sample/Big_Buck_Bunny_1080p_surround.mp4";
const API_KEY_ENV: &str = "REELSHELF_OMDB_API_KEY";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub omdb: OmdbConfig,
    pub player: PlayerConfig,
    pub feed: Vec<FeedRow>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OmdbConfig {
    pub base_url: String,
    pub api_key: String,
    pub attempts: usize,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub sample_url: String,
}

/// One row of the home feed: a heading and the search term that fills it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedRow {
    pub name: String,
    pub query: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            omdb: OmdbConfig::default(),
            player: PlayerConfig::default(),
            feed: default_feed(),
        }
    }
}

impl Default for OmdbConfig {
    fn default() -> Self {
        let http = HttpOptions::default();
        Self {
            base_url: DEFAULT_OMDB_URL.to_string(),
            api_key: DEFAULT_OMDB_API_KEY.to_string(),
            attempts: http.attempts,
            connect_timeout_ms: http.connect_timeout.as_millis() as u64,
            read_timeout_ms: http.read_timeout.as_millis() as u64,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            args: vec!["--force-window=yes".to_string()],
            sample_url: DEFAULT_SAMPLE_URL.to_string(),
        }
    }
}

fn default_feed() -> Vec<FeedRow> {
    [
        ("Trending Now", "Avengers"),
        ("Action Movies", "Action"),
        ("Drama Series", "Drama"),
        ("Sci-Fi & Fantasy", "Inception"),
        ("Thrillers", "Thriller"),
    ]
    .into_iter()
    .map(|(name, query)| FeedRow {
        name: name.to_string(),
        query: query.to_string(),
    })
    .collect()
}

impl OmdbConfig {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            attempts: self.attempts.max(1),
            ..HttpOptions::default()
        }
    }
}

impl Config {
    /// Reads the TOML file when it exists, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            Self::from_toml(&raw)
                .with_context(|| format!("invalid config at {}", path.display()))?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            config.omdb.api_key = key.trim().to_string();
        }
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        if config.feed.is_empty() {
            config.feed = default_feed();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.feed.len(), 5);
        assert_eq!(config.feed[0].name, "Trending Now");
        assert_eq!(config.feed[0].query, "Avengers");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = r#"
            [omdb]
            api_key = "abc123"
            attempts = 0

            [player]
            command = "vlc"

            [[feed]]
            name = "Westerns"
            query = "Western"
        "#;
        let config = Config::from_toml(raw).expect("parse");
        assert_eq!(config.omdb.api_key, "abc123");
        assert_eq!(config.omdb.base_url, DEFAULT_OMDB_URL);
        assert_eq!(config.omdb.http_options().attempts, 1);
        assert_eq!(config.player.command, "vlc");
        assert_eq!(config.player.sample_url, DEFAULT_SAMPLE_URL);
        assert_eq!(
            config.feed,
            vec![FeedRow {
                name: "Westerns".to_string(),
                query: "Western".to_string()
            }]
        );
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.omdb.base_url, DEFAULT_OMDB_URL);
        assert_eq!(config.omdb.attempts, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[omdb\nbroken").expect("write");
        let err = Config::load(&path).expect_err("should fail");
        assert!(err.to_string().contains("invalid config"));
    }
}
