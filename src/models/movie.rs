//! Catalog entities as returned by the upstream movie API.
//!
//! These are immutable snapshots: the client never edits them, it only
//! replaces them with a fresher response.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::format;
use serde::{Deserialize, Deserializer, Serialize};

/// Genre as exposed by the upstream `genres` query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub title: String,
}

/// A single movie. Every field other than `id` and `title` may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// ISO-8601 duration, e.g. `PT2H18M`.
    #[serde(default)]
    pub duration: Option<String>,
    /// Classification such as `PG-13`.
    #[serde(default)]
    pub rating: Option<String>,
    /// Score between 0 and 10.
    #[serde(default)]
    pub rating_value: Option<f64>,
    #[serde(default)]
    pub date_published: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub main_actors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub directors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub writers: Vec<String>,
}

impl Movie {
    pub fn year(&self) -> String {
        format::year(self.date_published.as_deref())
    }

    pub fn display_duration(&self) -> String {
        format::duration(self.duration.as_deref())
    }

    pub fn trailer_url(&self) -> String {
        format::trailer_search_url(&self.title, self.date_published.as_deref())
    }
}

/// Page metadata computed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// `PaginationInput` argument of the `movies` query. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInput {
    pub page: u32,
    pub per_page: u32,
}

impl PaginationInput {
    /// Clamps both values to at least 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// The single-item page whose `totalPages` equals the total item count.
    pub fn count_only() -> Self {
        Self::new(1, 1)
    }
}

/// `MovieFilterInput` argument of the `movies` query.
///
/// Absent fields mean "no filter"; they are skipped on the wire so that an
/// empty filter and a missing filter produce the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl MovieFilter {
    pub fn new(search: Option<&str>, genre: &GenreSelection) -> Self {
        Self {
            search: search.map(str::to_string),
            genre: genre.as_filter_value().map(str::to_string),
        }
        .normalized()
    }

    /// Drops empty search text, empty genre names and the `"all"` sentinel.
    pub fn normalized(self) -> Self {
        Self {
            search: self.search.filter(|s| !s.is_empty()),
            genre: self
                .genre
                .filter(|g| !g.is_empty() && g != GenreSelection::ALL_SENTINEL),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.genre.is_none()
    }
}

/// Genre picked in the UI. The literal `"all"` exists only at that
/// boundary and maps to [`GenreSelection::All`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum GenreSelection {
    #[default]
    All,
    Named(String),
}

impl GenreSelection {
    pub const ALL_SENTINEL: &'static str = "all";

    pub fn as_filter_value(&self) -> Option<&str> {
        match self {
            GenreSelection::All => None,
            GenreSelection::Named(title) => Some(title.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GenreSelection::All => Self::ALL_SENTINEL,
            GenreSelection::Named(title) => title,
        }
    }
}

impl From<&str> for GenreSelection {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == Self::ALL_SENTINEL {
            GenreSelection::All
        } else {
            GenreSelection::Named(value.to_string())
        }
    }
}

/// Result of the `movies` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieConnection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodes: Vec<Movie>,
    pub pagination: PaginationInfo,
}

/// Result of the `genres` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreConnection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodes: Vec<Genre>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_deserialize_with_nulls() {
        let movie: Movie = serde_json::from_value(json!({
            "id": "m1",
            "title": "Inception",
            "posterUrl": null,
            "summary": "Dreams within dreams",
            "duration": "PT2H28M",
            "rating": "PG-13",
            "ratingValue": 8.8,
            "datePublished": "2010-07-16T00:00:00.000Z",
            "genres": [{ "id": "g1", "title": "Sci-Fi" }],
            "directors": null
        }))
        .unwrap();

        assert_eq!(movie.poster_url, None);
        assert_eq!(movie.genres.len(), 1);
        assert!(movie.directors.is_empty());
        assert!(movie.main_actors.is_empty());
        assert_eq!(movie.year(), "2010");
        assert_eq!(movie.display_duration(), "2h 28m");
    }

    #[test]
    fn test_genre_sentinel_is_never_a_filter() {
        let all = GenreSelection::from("all");
        assert_eq!(all, GenreSelection::All);
        assert_eq!(MovieFilter::new(None, &all), MovieFilter::default());

        let drama = GenreSelection::from("Drama");
        let filter = MovieFilter::new(Some(""), &drama);
        assert_eq!(filter.search, None);
        assert_eq!(filter.genre.as_deref(), Some("Drama"));

        let raw = MovieFilter {
            search: Some("alien".to_string()),
            genre: Some("all".to_string()),
        };
        assert_eq!(raw.normalized().genre, None);
    }

    #[test]
    fn test_empty_filter_serializes_without_fields() {
        let value = serde_json::to_value(MovieFilter::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_pagination_input_clamps() {
        assert_eq!(PaginationInput::new(0, 0), PaginationInput { page: 1, per_page: 1 });
        assert_eq!(PaginationInput::count_only().per_page, 1);
    }
}
