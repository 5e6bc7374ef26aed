//! Browsing state for the movie grid.
//!
//! Holds the search text, the selected genre and the current page. Any
//! change to the search text or genre moves back to page 1, so a page
//! number from an old filter is never sent with a new one.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::format::{page_window, PageItem};
use crate::models::{GenreSelection, MovieFilter, PaginationInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    search: String,
    genre: GenreSelection,
    page: u32,
    per_page: u32,
}

impl BrowseState {
    pub fn new(per_page: u32) -> Self {
        Self {
            search: String::new(),
            genre: GenreSelection::All,
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn genre(&self) -> &GenreSelection {
        &self.genre
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.search {
            self.search = text;
            self.page = 1;
        }
    }

    pub fn set_genre(&mut self, genre: impl Into<GenreSelection>) {
        let genre = genre.into();
        if genre != self.genre {
            self.genre = genre;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn filter(&self) -> MovieFilter {
        MovieFilter::new(Some(self.search.as_str()), &self.genre)
    }

    pub fn pagination(&self) -> PaginationInput {
        PaginationInput::new(self.page, self.per_page)
    }

    /// Arguments for the next `movies` fetch.
    pub fn variables(&self) -> (PaginationInput, MovieFilter) {
        (self.pagination(), self.filter())
    }

    /// Page buttons for a result with `total_pages` pages.
    pub fn page_window(&self, total_pages: u32) -> Vec<PageItem> {
        page_window(self.page, total_pages)
    }

    /// Result line such as `Found 3 movies for "alien" in Sci-Fi`.
    pub fn summary(&self, total_count: u32) -> String {
        let noun = if total_count == 1 { "movie" } else { "movies" };
        let mut line = format!("Found {} {}", total_count, noun);
        if !self.search.is_empty() {
            line.push_str(&format!(" for \"{}\"", self.search));
        }
        if let GenreSelection::Named(title) = &self.genre {
            line.push_str(&format!(" in {}", title));
        }
        line
    }
}

impl From<String> for GenreSelection {
    fn from(value: String) -> Self {
        GenreSelection::from(value.as_str())
    }
}
