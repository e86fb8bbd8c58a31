//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use crate::error::{Result, TurnstileError};

/// Prefix for environment overrides, e.g. `TURNSTILE__SERVER__ADMIN_KEY`.
const ENV_PREFIX: &str = "TURNSTILE";
/// Legacy variable holding the admin key in existing deployments.
const LEGACY_ADMIN_KEY_VAR: &str = "ADMIN_KEY";

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,

    /// Shared secret for the admin snapshot endpoint. Unset disables it.
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            admin_key: None,
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Length of one fixed window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests admitted per client within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,

    /// Message returned to rejected clients
    #[serde(default = "default_message")]
    pub message: String,

    /// HTTP status used for rejections
    #[serde(default = "default_status_code")]
    pub status_code: u16,

    /// How expired client windows are swept
    #[serde(default)]
    pub eviction: EvictionConfig,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            message: default_message(),
            status_code: default_status_code(),
            eviction: EvictionConfig::default(),
        }
    }
}

pub(crate) fn default_window_ms() -> u64 {
    60_000
}

pub(crate) fn default_max_requests() -> u64 {
    30
}

pub(crate) fn default_message() -> String {
    "Muitas requisições. Tente novamente em 1 minuto.".to_string()
}

pub(crate) fn default_status_code() -> u16 {
    429
}

/// Sweep cadence for expired client windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionMode {
    /// Sweep inline on a random fraction of admissions
    #[default]
    Probabilistic,
    /// Sweep inline at most once per interval
    Interval,
    /// Sweep from a background task only
    Background,
}

/// Eviction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    #[serde(default)]
    pub mode: EvictionMode,

    /// Chance of sweeping on each admission (probabilistic mode)
    #[serde(default = "default_sweep_probability")]
    pub probability: f64,

    /// Sweep period in milliseconds (interval and background modes)
    #[serde(default = "default_sweep_interval_ms")]
    pub interval_ms: u64,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            mode: EvictionMode::default(),
            probability: default_sweep_probability(),
            interval_ms: default_sweep_interval_ms(),
        }
    }
}

fn default_sweep_probability() -> f64 {
    0.1
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

impl TurnstileConfig {
    /// Load configuration from an optional YAML file layered under
    /// `TURNSTILE__*` environment variables.
    ///
    /// Env values stay strings until deserialized, so numeric fields parse
    /// while string fields such as `admin_key` keep their exact text.
    /// `ADMIN_KEY` fills the admin key only when no layer set one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Yaml,
            ));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let config: TurnstileConfig = builder
            .build()
            .and_then(|c| c.try_deserialize::<TurnstileConfig>())
            .map_err(|e| TurnstileError::Config(e.to_string()))?;

        config.finish(std::env::var(LEGACY_ADMIN_KEY_VAR).ok())
    }

    /// Parse configuration from a YAML string, without env layering.
    ///
    /// Applies the same admin-key normalization and validation as [`load`].
    ///
    /// [`load`]: TurnstileConfig::load
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TurnstileConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(e.to_string()))?;
        config.finish(None)
    }

    fn finish(mut self, fallback_admin_key: Option<String>) -> Result<Self> {
        if self.server.admin_key.is_none() {
            self.server.admin_key = fallback_admin_key;
        }
        self.normalize();
        self.validate()?;
        Ok(self)
    }

    fn normalize(&mut self) {
        // An empty key would let a request with an empty header through.
        if self.server.admin_key.as_deref().is_some_and(str::is_empty) {
            self.server.admin_key = None;
        }
    }

    /// Reject settings the limiter cannot run with.
    pub fn validate(&self) -> Result<()> {
        let rl = &self.rate_limiting;

        if rl.window_ms == 0 {
            return Err(TurnstileError::Config("window_ms must be positive".into()));
        }
        if rl.max_requests == 0 {
            return Err(TurnstileError::Config("max_requests must be positive".into()));
        }
        if !(400..=599).contains(&rl.status_code) {
            return Err(TurnstileError::Config(format!(
                "status_code {} is not an HTTP error status",
                rl.status_code
            )));
        }

        match rl.eviction.mode {
            EvictionMode::Probabilistic => {
                if !(0.0..=1.0).contains(&rl.eviction.probability) {
                    return Err(TurnstileError::Config(format!(
                        "eviction probability {} is outside [0, 1]",
                        rl.eviction.probability
                    )));
                }
            }
            EvictionMode::Interval | EvictionMode::Background => {
                if rl.eviction.interval_ms == 0 {
                    return Err(TurnstileError::Config(
                        "eviction interval_ms must be positive".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}
