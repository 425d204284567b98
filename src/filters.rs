use std::fmt;
use std::str::FromStr;

use crate::movie::MovieRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    High,
    Medium,
    Low,
}

impl RatingBand {
    fn accepts(self, rating: f64) -> bool {
        match self {
            Self::High => rating >= 7.0,
            Self::Medium => (6.0..7.0).contains(&rating),
            Self::Low => rating < 6.0,
        }
    }
}

impl FromStr for RatingBand {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "unknown rating band '{other}' (expected high, medium or low)"
            )),
        }
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "high (7+)",
            Self::Medium => "medium (6-7)",
            Self::Low => "low (<6)",
        };
        f.write_str(label)
    }
}

/// Client-side narrowing of a result list. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub year: Option<i32>,
    pub rating: Option<RatingBand>,
    pub kind: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.rating.is_none() && self.kind.is_none()
    }

    pub fn matches(&self, movie: &MovieRecord) -> bool {
        if let Some(year) = self.year
            && movie.year().and_then(leading_year) != Some(year)
        {
            return false;
        }

        if let Some(band) = self.rating {
            let rating = movie
                .imdb_rating()
                .and_then(|raw| raw.parse::<f64>().ok())
                .unwrap_or(0.0);
            if !band.accepts(rating) {
                return false;
            }
        }

        if let Some(kind) = self.kind.as_deref()
            && movie.kind() != Some(kind)
        {
            return false;
        }

        true
    }

    pub fn apply(&self, movies: Vec<MovieRecord>) -> Vec<MovieRecord> {
        if self.is_empty() {
            return movies;
        }
        movies.into_iter().filter(|m| self.matches(m)).collect()
    }
}

/// Leading integer of an OMDb year such as `"1999"`, `"2010–2013"` or `"2019–"`.
pub(crate) fn leading_year(raw: &str) -> Option<i32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, year: &str, rating: Option<&str>, kind: &str) -> MovieRecord {
        let mut m = MovieRecord::new(id)
            .with_field("Year", year)
            .with_field("Type", kind);
        if let Some(rating) = rating {
            m = m.with_field("imdbRating", rating);
        }
        m
    }

    fn ids(movies: &[MovieRecord]) -> Vec<&str> {
        movies.iter().map(|m| m.imdb_id.as_str()).collect()
    }

    #[test]
    fn leading_year_handles_ranges() {
        assert_eq!(leading_year("1999"), Some(1999));
        assert_eq!(leading_year("2010–2013"), Some(2010));
        assert_eq!(leading_year("2019–"), Some(2019));
        assert_eq!(leading_year("N/A"), None);
    }

    #[test]
    fn empty_filters_keep_everything() {
        let movies = vec![movie("tt1", "1999", None, "movie")];
        assert_eq!(SearchFilters::default().apply(movies.clone()), movies);
    }

    #[test]
    fn year_filter_matches_series_start_year() {
        let filters = SearchFilters {
            year: Some(2010),
            ..Default::default()
        };
        let movies = vec![
            movie("tt1", "2010", None, "movie"),
            movie("tt2", "2010–2013", None, "series"),
            movie("tt3", "2011", None, "movie"),
        ];
        assert_eq!(ids(&filters.apply(movies)), ["tt1", "tt2"]);
    }

    #[test]
    fn rating_bands_treat_missing_rating_as_zero() {
        let movies = vec![
            movie("hi", "2000", Some("7.0"), "movie"),
            movie("mid", "2000", Some("6.5"), "movie"),
            movie("low", "2000", Some("5.9"), "movie"),
            movie("none", "2000", None, "movie"),
            movie("na", "2000", Some("N/A"), "movie"),
        ];
        let by_band = |band| {
            let filters = SearchFilters {
                rating: Some(band),
                ..Default::default()
            };
            filters
                .apply(movies.clone())
                .into_iter()
                .map(|m| m.imdb_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(by_band(RatingBand::High), ["hi"]);
        assert_eq!(by_band(RatingBand::Medium), ["mid"]);
        assert_eq!(by_band(RatingBand::Low), ["low", "none", "na"]);
    }

    #[test]
    fn type_filter_is_exact() {
        let filters = SearchFilters {
            kind: Some("series".to_string()),
            ..Default::default()
        };
        let movies = vec![
            movie("tt1", "2000", None, "movie"),
            movie("tt2", "2000", None, "series"),
        ];
        assert_eq!(ids(&filters.apply(movies)), ["tt2"]);
    }

    #[test]
    fn rating_band_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<RatingBand>(), Ok(RatingBand::High));
        assert!("great".parse::<RatingBand>().is_err());
    }
}
