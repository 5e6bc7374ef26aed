// GraphQL documents used by the data-fetch client
// Author: kelexine (https://github.com/kelexine)

/// One page of movies for a filter.
pub const GET_MOVIES: &str = r#"
query GetMovies($pagination: PaginationInput!, $where: MovieFilterInput) {
  movies(pagination: $pagination, where: $where) {
    nodes {
      id
      title
      posterUrl
      summary
      duration
      rating
      ratingValue
      datePublished
      mainActors
      directors
      writers
      genres {
        id
        title
      }
    }
    pagination {
      page
      perPage
      totalPages
    }
  }
}
"#;

/// Page metadata only. Sent with `perPage: 1` so that `totalPages` is the
/// number of matching movies.
pub const GET_MOVIE_COUNT: &str = r#"
query GetMovieCount($pagination: PaginationInput!, $where: MovieFilterInput) {
  movies(pagination: $pagination, where: $where) {
    pagination {
      page
      perPage
      totalPages
    }
  }
}
"#;

pub const GET_GENRES: &str = r#"
query GetGenres {
  genres {
    nodes {
      id
      title
    }
  }
}
"#;
