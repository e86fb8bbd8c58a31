//! Admission policy shared by every client.

use crate::config::{
    default_max_requests, default_message, default_status_code, default_window_ms,
    RateLimitingConfig,
};

/// The fixed-window policy applied to every client identifier.
///
/// The limiter trusts these values; [`crate::config::TurnstileConfig::validate`]
/// rejects unusable ones at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Length of one window in milliseconds
    pub window_ms: u64,
    /// Requests admitted per client within one window
    pub max_requests: u64,
    /// Message returned to rejected clients
    pub message: String,
    /// Status code the routing layer uses for rejections
    pub status_code: u16,
}

impl RateLimitPolicy {
    pub fn new(window_ms: u64, max_requests: u64) -> Self {
        Self {
            window_ms,
            max_requests,
            ..Self::default()
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            message: default_message(),
            status_code: default_status_code(),
        }
    }
}

impl From<&RateLimitingConfig> for RateLimitPolicy {
    fn from(config: &RateLimitingConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            max_requests: config.max_requests,
            message: config.message.clone(),
            status_code: config.status_code,
        }
    }
}
