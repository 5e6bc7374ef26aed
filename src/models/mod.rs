// Wire types for the movie API
// Author: kelexine (https://github.com/kelexine)

pub mod graphql;
pub mod movie;

pub use graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};
pub use movie::{
    Genre, GenreConnection, GenreSelection, Movie, MovieConnection, MovieFilter,
    PaginationInfo, PaginationInput,
};
