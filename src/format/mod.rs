//! Display helpers for upstream movie fields.
//!
//! Upstream dates and durations arrive as ISO-8601 strings. These functions
//! turn them into the short labels shown on movie cards and never fail: an
//! absent value renders as [`NOT_AVAILABLE`].
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod pagination;

pub use pagination::{page_window, PageItem};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel shown for absent or unparsable values.
pub const NOT_AVAILABLE: &str = "N/A";

// Unanchored on purpose: `xxPT2H` still yields "2h".
static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?").expect("duration pattern is valid"));

// `YYYY-MM-DDTHH:MM` with an optional `Z` or `±HH:MM` offset
static MINUTE_PRECISION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2})([Zz]|[+-]\d{2}:\d{2})?$")
        .expect("minute precision pattern is valid")
});

// `YYYY` or `YYYY-MM`
static REDUCED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{2}))?$").expect("reduced date pattern is valid"));

/// Extracts the UTC year from an ISO-8601 date or timestamp.
///
/// Returns `"N/A"` when the input is absent, empty or unparsable.
pub fn year(date_published: Option<&str>) -> String {
    date_published
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_year)
        .map(|y| y.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn parse_year(input: &str) -> Option<i32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).year());
    }
    if let Some(caps) = MINUTE_PRECISION.captures(input) {
        // Timestamps without an offset are read as UTC
        let offset = match caps.get(2).map(|m| m.as_str()) {
            None | Some("Z") | Some("z") => "Z",
            Some(offset) => offset,
        };
        let padded = format!("{}:00{}", &caps[1], offset);
        return DateTime::parse_from_rfc3339(&padded)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.year());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Some(caps) = REDUCED_DATE.captures(input) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 1,
        };
        return NaiveDate::from_ymd_opt(year, month, 1).map(|date| date.year());
    }
    None
}

/// Formats an ISO-8601 `PT[nH][mM]` duration as `"2h 18m"`.
///
/// - zero segments are dropped (`PT2H` -> `"2h"`, `PT90M` -> `"90m"`)
/// - a zero duration renders as an empty string
/// - an absent or empty input renders as `"N/A"`
/// - input that does not contain the pattern, or whose numbers do not fit,
///   is returned unchanged
pub fn duration(iso_duration: Option<&str>) -> String {
    let raw = match iso_duration {
        Some(s) if !s.is_empty() => s,
        _ => return NOT_AVAILABLE.to_string(),
    };

    let Some(caps) = DURATION_PATTERN.captures(raw) else {
        return raw.to_string();
    };

    let segment = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    let (Some(hours), Some(minutes)) = (segment(1), segment(2)) else {
        return raw.to_string();
    };

    match (hours, minutes) {
        (0, 0) => String::new(),
        (h, 0) => format!("{}h", h),
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Builds a YouTube search link for the movie's trailer.
///
/// The year is appended to the query when it can be derived from
/// `date_published`.
pub fn trailer_search_url(title: &str, date_published: Option<&str>) -> String {
    let year = year(date_published);
    let query = if year == NOT_AVAILABLE {
        format!("{} Official Trailer", title)
    } else {
        format!("{} {} Official Trailer", title, year)
    };
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(&query)
    )
}
