//! Axum-based HTTP gateway for the bitflix movie catalog.
//!
//! This module terminates client requests, enforces per-client quotas and
//! body limits, and forwards health checks and GraphQL operations to the
//! upstream movie API with the bearer credential injected.
//!
//! # Components
//!
//! - `handlers`: Health check, GraphQL, preflight and metrics endpoints.
//! - `middleware`: Request IDs, rate limiting and request metrics.
//! - `rate_limit`: The per-client fixed window counter.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
pub mod rate_limit;
mod routes;

pub use rate_limit::{Decision, Quota, RateLimiter};
pub use routes::{create_router, AppState};
