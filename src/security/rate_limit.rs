//! Per-client-IP rate limiting.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::schema::RateLimitConfig;
use crate::observability::metrics;

/// Buckets idle this long are dropped when the table is pruned.
const IDLE_BUCKET_TTL: Duration = Duration::from_secs(60);

/// The table is pruned once it holds this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token buckets keyed by client IP.
pub struct RateLimiterState {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    rps: f64,
    burst: f64,
}

impl RateLimiterState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            rps: f64::from(config.requests_per_second),
            burst: f64::from(config.burst_size),
        }
    }

    /// Take one token for `ip`. Returns false when the bucket is empty.
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        if buckets.len() >= PRUNE_THRESHOLD {
            let now = Instant::now();
            buckets.retain(|_, b| now.duration_since(b.last_update) < IDLE_BUCKET_TTL);
        }

        buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.burst))
            .try_acquire(self.burst, self.rps)
    }
}

/// Reject requests from clients that have spent their budget.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.check(addr.ip()) {
        next.run(request).await
    } else {
        tracing::warn!(client = %addr.ip(), "Rate limit exceeded");
        metrics::record_rate_limited();
        (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
    }
}
