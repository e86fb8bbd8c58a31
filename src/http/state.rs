//! Shared state for HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::ratelimit::{Clock, RateLimiter};

/// Shared application state, cloneable across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    admin_key: Option<String>,
    start_time: Instant,
}

impl AppState {
    pub fn new(limiter: Arc<RateLimiter>, clock: Arc<dyn Clock>, admin_key: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                limiter,
                clock,
                admin_key,
                start_time: Instant::now(),
            }),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    /// Current time from the configured clock, in epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    /// Shared secret for the admin endpoint, if one is configured.
    pub fn admin_key(&self) -> Option<&str> {
        self.inner.admin_key.as_deref()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
