//! Data-fetch layer.
//!
//! Issues the `movies` and `genres` queries through a shared
//! [`QueryCache`](crate::cache::QueryCache) and reports results as a
//! [`FetchState`]. [`BrowseState`] keeps the search, genre and page
//! selections consistent between fetches.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod browse;
pub mod fetch;
pub mod queries;
pub mod state;

pub use browse::BrowseState;
pub use fetch::{movie_variables, MovieClient, MoviePage};
pub use state::FetchState;
