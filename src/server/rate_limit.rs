//! Per-client rate limiting on top of `governor`.
//!
//! Each client identity owns a GCRA cell in a keyed limiter. A client may
//! burst up to `max_requests` at once and regains one request every
//! `window / max_requests`, so no client gets more than `max_requests`
//! within any window. Rejected requests consume nothing.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::{ProxyError, Result};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

type KeyedLimiter<C> = governor::RateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    StateInformationMiddleware,
>;

/// Quota state reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl Quota {
    /// Whole seconds until the next request would be admitted (rejections)
    /// or until the full quota is back (admissions), never less than one.
    pub fn reset_after_secs(&self) -> u64 {
        let millis = self.reset_after.as_millis() as u64;
        millis.div_ceil(1000).max(1)
    }

    /// Writes the standard `RateLimit-*` headers.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(self.limit));
        headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(self.remaining));
        headers.insert(RATE_LIMIT_RESET.clone(), HeaderValue::from(self.reset_after_secs()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted(Quota),
    Rejected(Quota),
}

/// Shared limiter. Cell updates are atomic, so concurrent requests from the
/// same client never undercount.
pub struct RateLimiter<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    clock: C,
    window: Duration,
    replenish: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Result<Self> {
        Self::with_clock(window, max_requests, DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Builds a limiter driven by `clock`.
    pub fn with_clock(window: Duration, max_requests: u32, clock: C) -> Result<Self> {
        let burst = NonZeroU32::new(max_requests)
            .ok_or_else(|| ProxyError::Config("rate_limit.max_requests must be positive".to_string()))?;
        let replenish = window / max_requests;
        let quota = governor::Quota::with_period(replenish)
            .ok_or_else(|| {
                ProxyError::Config(format!(
                    "rate limit window {:?} is too short for {} requests",
                    window, max_requests
                ))
            })?
            .allow_burst(burst);

        let limiter = governor::RateLimiter::<
            String,
            DefaultKeyedStateStore<String>,
            C,
            governor::middleware::NoOpMiddleware<C::Instant>,
        >::new(quota, DefaultKeyedStateStore::default(), &clock)
            .with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            limiter,
            clock,
            window,
            replenish,
            max_requests,
        })
    }

    pub fn check(&self, client: &str) -> Decision {
        match self.limiter.check_key(&client.to_string()) {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity();
                let used = self.max_requests.saturating_sub(remaining);
                Decision::Admitted(Quota {
                    limit: self.max_requests,
                    remaining,
                    reset_after: self.replenish * used,
                })
            }
            Err(not_until) => Decision::Rejected(Quota {
                limit: self.max_requests,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            }),
        }
    }

    /// Forgets clients whose quota has fully recovered. Returns how many
    /// were removed.
    pub fn prune(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl<C: Clock + Send + Sync + 'static> RateLimiter<C> {
    /// Prunes recovered clients once per window length until aborted.
    pub fn spawn_pruner(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.window);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.prune();
                if removed > 0 {
                    debug!("Pruned {} idle rate-limit entries", removed);
                }
            }
        })
    }
}
