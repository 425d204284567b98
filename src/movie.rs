use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A movie or show as returned by the metadata API, keyed by `imdbID`.
///
/// Everything except the identity and the library bookkeeping fields is kept
/// verbatim in `fields` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "addedDate", default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(
        rename = "watchedDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub watched_date: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MovieRecord {
    pub fn new(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            added_date: None,
            duration: None,
            watched_date: None,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty() && *value != "N/A")
    }

    pub fn title(&self) -> Option<&str> {
        self.field_str("Title")
    }

    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(self.imdb_id.as_str())
    }

    pub fn year(&self) -> Option<&str> {
        self.field_str("Year")
    }

    pub fn kind(&self) -> Option<&str> {
        self.field_str("Type")
    }

    pub fn poster(&self) -> Option<&str> {
        self.field_str("Poster")
    }

    pub fn imdb_rating(&self) -> Option<&str> {
        self.field_str("imdbRating")
    }

    pub fn plot(&self) -> Option<&str> {
        self.field_str("Plot")
    }

    pub fn genre(&self) -> Option<&str> {
        self.field_str("Genre")
    }

    pub fn runtime(&self) -> Option<&str> {
        self.field_str("Runtime")
    }

    pub fn director(&self) -> Option<&str> {
        self.field_str("Director")
    }

    pub fn actors(&self) -> Option<&str> {
        self.field_str("Actors")
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
