//! Core rate limiter implementation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::config::RateLimitingConfig;

use super::decision::Decision;
use super::eviction::{self, EvictionStrategy, ProbabilisticSweep};
use super::policy::RateLimitPolicy;
use super::report::{ClientLoad, LoadReport, PolicyReport};
use super::window::ClientWindow;

/// Per-client fixed-window rate limiter.
///
/// Holds one [`ClientWindow`] per client identifier. The check and update
/// for one identifier happen under that key's shard lock, so concurrent
/// requests from the same client cannot both take the last slot.
///
/// State lives only in this process. Running several instances multiplies
/// the effective limit by the instance count.
pub struct RateLimiter {
    /// Client windows indexed by client identifier
    clients: DashMap<String, ClientWindow>,
    /// Policy applied to every client
    policy: RateLimitPolicy,
    /// When to sweep expired windows inline
    eviction: Box<dyn EvictionStrategy>,
}

impl RateLimiter {
    /// Create a rate limiter that sweeps on ~10% of calls.
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_eviction(policy, Box::new(ProbabilisticSweep::default()))
    }

    /// Create a rate limiter with a specific sweep strategy.
    pub fn with_eviction(policy: RateLimitPolicy, eviction: Box<dyn EvictionStrategy>) -> Self {
        Self {
            clients: DashMap::new(),
            policy,
            eviction,
        }
    }

    /// Create a rate limiter from the `rate_limiting` config section.
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self::with_eviction(
            RateLimitPolicy::from(config),
            eviction::from_config(&config.eviction),
        )
    }

    /// Decide whether a request from `client_identifier` may proceed.
    ///
    /// Never fails. Any string, including the empty string, is a valid key.
    pub fn admit(&self, client_identifier: &str, now_ms: u64) -> Decision {
        // Must run before the entry lock below is taken.
        if self.eviction.should_sweep(now_ms) {
            self.sweep(now_ms);
        }

        let limit = self.policy.max_requests;

        match self.clients.entry(client_identifier.to_string()) {
            Entry::Vacant(vacant) => {
                let window = ClientWindow::open(now_ms, self.policy.window_ms);
                vacant.insert(window);
                trace!(client = %client_identifier, "Opened window for new client");
                self.admitted(&window)
            }
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();

                if window.is_expired(now_ms) {
                    *window = ClientWindow::open(now_ms, self.policy.window_ms);
                    trace!(client = %client_identifier, "Window expired, reopened");
                    return self.admitted(window);
                }

                if window.count() < limit {
                    window.record();
                    trace!(
                        client = %client_identifier,
                        count = window.count(),
                        "Request admitted"
                    );
                    return self.admitted(window);
                }

                let retry_after_secs = window.retry_after_secs(now_ms);
                debug!(
                    client = %client_identifier,
                    count = window.count(),
                    limit = limit,
                    retry_after_secs = retry_after_secs,
                    "Rate limit exceeded"
                );

                Decision::Reject {
                    limit,
                    reset_time_ms: window.window_end_ms(),
                    retry_after_secs,
                    status_code: self.policy.status_code,
                    message: self.policy.message.clone(),
                }
            }
        }
    }

    fn admitted(&self, window: &ClientWindow) -> Decision {
        Decision::Admit {
            limit: self.policy.max_requests,
            remaining: window.remaining(self.policy.max_requests),
            reset_time_ms: window.window_end_ms(),
        }
    }

    /// Report every client whose window is still active at `now_ms`.
    ///
    /// Read-only: expired windows are skipped, not removed.
    pub fn snapshot(&self, now_ms: u64) -> LoadReport {
        let limit = self.policy.max_requests;

        let mut active_ips: Vec<ClientLoad> = self
            .clients
            .iter()
            .filter(|entry| !entry.value().is_expired(now_ms))
            .map(|entry| {
                let window = entry.value();
                ClientLoad {
                    ip: entry.key().clone(),
                    count: window.count(),
                    reset_time: window.window_end_ms(),
                    remaining: window.remaining(limit),
                }
            })
            .collect();
        active_ips.sort_by(|a, b| a.ip.cmp(&b.ip));

        LoadReport {
            total_active_ips: active_ips.len(),
            active_ips,
            config: PolicyReport::from(&self.policy),
        }
    }

    /// Remove every expired window. Returns how many were removed.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, window| !window.is_expired(now_ms));
        let removed = before.saturating_sub(self.clients.len());

        if removed > 0 {
            debug!(removed = removed, remaining = self.clients.len(), "Swept expired windows");
        }
        removed
    }

    /// Get the policy this limiter enforces.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Get the number of stored windows, expired ones included.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Clear all client windows.
    pub fn clear(&self) {
        self.clients.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
