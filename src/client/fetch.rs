// Data-fetch client: cache-first GraphQL queries for movies and genres
// Author: kelexine (https://github.com/kelexine)

use super::queries::{GET_GENRES, GET_MOVIES, GET_MOVIE_COUNT};
use super::state::FetchState;
use crate::cache::{CacheConfig, CacheKey, QueryCache};
use crate::config::ClientConfig;
use crate::error::{ProxyError, Result};
use crate::models::{
    Genre, GenreConnection, GraphQlRequest, GraphQlResponse, Movie, MovieConnection, MovieFilter,
    PaginationInfo, PaginationInput,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const OP_MOVIES: &str = "movies";
pub const OP_MOVIE_COUNT: &str = "moviesCount";
pub const OP_GENRES: &str = "genres";

/// One page of results plus the total number of matching movies.
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    pub pagination: PaginationInfo,
    pub total_count: u32,
}

#[derive(Deserialize)]
struct MoviesData {
    movies: MovieConnection,
}

#[derive(Deserialize)]
struct CountData {
    movies: CountConnection,
}

#[derive(Deserialize)]
struct CountConnection {
    pagination: PaginationInfo,
}

#[derive(Deserialize)]
struct GenresData {
    genres: GenreConnection,
}

/// GraphQL client backed by a [`QueryCache`].
///
/// Reads are cache-first: a present entry is returned without touching the
/// network, however old it is. Only successful responses are written back.
/// The cache lifecycle belongs to the caller; this type never starts or
/// stops the sweep.
#[derive(Clone)]
pub struct MovieClient {
    http_client: Client,
    graphql_url: String,
    bearer: Option<String>,
    cache: QueryCache,
}

impl MovieClient {
    pub fn new(graphql_url: impl Into<String>, cache: QueryCache) -> Result<Self> {
        let graphql_url = graphql_url.into();
        reqwest::Url::parse(&graphql_url)
            .map_err(|e| ProxyError::Config(format!("invalid GraphQL URL {:?}: {}", graphql_url, e)))?;

        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            graphql_url,
            bearer: None,
            cache,
        })
    }

    /// Builds a client and an idle cache from the `client` config section.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            config.graphql_url.clone(),
            QueryCache::new(CacheConfig::from(config)),
        )
    }

    /// Sends `Authorization: Bearer <token>` on every query. Only needed
    /// when talking to the movie API directly instead of through the gateway.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn fetch_movies(
        &self,
        pagination: PaginationInput,
        filter: &MovieFilter,
    ) -> FetchState<MoviePage> {
        self.load_movies(pagination, filter).await.into()
    }

    /// Loads one page and the total count for `filter`.
    ///
    /// The total comes from a second query for the same filter with
    /// `perPage = 1`, whose `totalPages` equals the number of matches. Both
    /// queries run concurrently and are cached under separate keys. Each
    /// query caches its own success, so when one fails the other may still
    /// have been stored and is reused on the next call.
    pub async fn load_movies(
        &self,
        pagination: PaginationInput,
        filter: &MovieFilter,
    ) -> Result<MoviePage> {
        let filter = filter.clone().normalized();

        let page_vars = movie_variables(pagination, &filter);
        let page_key = CacheKey::from_value(OP_MOVIES, &page_vars);
        let count_vars = movie_variables(PaginationInput::count_only(), &filter);
        let count_key = CacheKey::from_value(OP_MOVIE_COUNT, &count_vars);

        let (page, count) = futures::try_join!(
            self.cached::<MoviesData>(page_key, GET_MOVIES, Some(page_vars)),
            self.cached::<CountData>(count_key, GET_MOVIE_COUNT, Some(count_vars)),
        )?;

        Ok(MoviePage {
            movies: page.movies.nodes,
            pagination: page.movies.pagination,
            total_count: count.movies.pagination.total_pages,
        })
    }

    pub async fn fetch_genres(&self) -> FetchState<Vec<Genre>> {
        self.load_genres().await.into()
    }

    pub async fn load_genres(&self) -> Result<Vec<Genre>> {
        let data: GenresData = self
            .cached(CacheKey::operation(OP_GENRES), GET_GENRES, None)
            .await?;
        Ok(data.genres.nodes)
    }

    async fn cached<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T> {
        if let Some(hit) = self.cache.read(&key) {
            return Ok(serde_json::from_value(hit.payload)?);
        }

        let data = self.execute(query, variables).await?;
        // Decode before writing so a malformed payload never lands in the cache
        let parsed = serde_json::from_value::<T>(data.clone())?;
        self.cache.write(key, data);
        Ok(parsed)
    }

    /// Posts a document and returns its `data` object.
    ///
    /// GraphQL `errors` and the gateway's `{ "error": ... }` bodies both
    /// become [`ProxyError::GraphQl`] carrying the server's message.
    async fn execute(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        let request_body = GraphQlRequest {
            query: query.to_string(),
            variables,
            operation_name: None,
        };

        let mut request = self.http_client.post(&self.graphql_url).json(&request_body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProxyError::GraphQl(format!("invalid response from {}: {}", self.graphql_url, e)))?;

        if let Some(message) = gateway_error(&body) {
            warn!("GraphQL request failed with {}: {}", status, message);
            return Err(ProxyError::GraphQl(message));
        }

        let envelope: GraphQlResponse<Value> = serde_json::from_value(body)?;
        if let Some(message) = envelope.error_message() {
            warn!("GraphQL errors: {}", message);
            return Err(ProxyError::GraphQl(message));
        }
        if !status.is_success() {
            return Err(ProxyError::GraphQl(format!("HTTP {}", status)));
        }

        debug!("GraphQL request succeeded");
        envelope
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| ProxyError::GraphQl("response carried no data".to_string()))
    }
}

/// Variables for the `movies` documents. `where` is left out entirely when
/// the filter is empty.
pub fn movie_variables(pagination: PaginationInput, filter: &MovieFilter) -> Value {
    let mut variables = json!({ "pagination": pagination });
    if !filter.is_empty() {
        variables["where"] = json!(filter);
    }
    variables
}

fn gateway_error(body: &Value) -> Option<String> {
    let error = body.get("error")?.as_str()?;
    match body.get("details").and_then(Value::as_str) {
        Some(details) => Some(format!("{}: {}", error, details)),
        None => Some(error.to_string()),
    }
}
