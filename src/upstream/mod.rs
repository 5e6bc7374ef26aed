// Upstream movie API module
// Author: kelexine (https://github.com/kelexine)

mod client;

pub use client::{with_deadline, UpstreamClient, UpstreamReply};

/// Metric/log label for health check forwarding.
pub const ROUTE_HEALTHCHECK: &str = "healthcheck";
/// Metric/log label for GraphQL forwarding.
pub const ROUTE_GRAPHQL: &str = "graphql";
