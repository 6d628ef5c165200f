//! Configuration Module
//!
//! Handles loading the access-layer configuration from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{GalleryError, Result};

/// OAuth 1.0a credentials for the upstream account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Cache sizing and per-class TTLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    pub albums_ttl: Duration,
    pub images_ttl: Duration,
    /// `None` means EXIF entries never expire
    pub exif_ttl: Option<Duration>,
    /// Interval between background expiry sweeps
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            albums_ttl: Duration::from_secs(24 * 60 * 60),
            images_ttl: Duration::from_secs(60 * 60),
            exif_ttl: None,
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Retry budget and timing for upstream requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Per-attempt timeout
    pub request_timeout: Duration,
}

impl RetryPolicy {
    /// Backoff before the attempt following `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Full configuration for the access layer and its HTTP surface.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Account identity; scopes the cache keys
    pub account: String,
    /// Upstream API origin
    pub api_base_url: String,
    pub cache: CacheSettings,
    pub retry: RetryPolicy,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_CONSUMER_KEY`, `API_CONSUMER_SECRET`, `API_ACCESS_TOKEN`,
    ///   `API_ACCESS_TOKEN_SECRET` - OAuth credentials (required)
    /// - `API_ACCOUNT` - Account identity (default: "default")
    /// - `API_BASE_URL` - Upstream origin (default: https://api.smugmug.com)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_ALBUMS_TTL_SECS` - Album list TTL (default: 86400)
    /// - `CACHE_IMAGES_TTL_SECS` - Image list TTL (default: 3600)
    /// - `CACHE_EXIF_TTL_SECS` - EXIF TTL, unset or 0 = never expires
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Expiry sweep frequency (default: 300)
    /// - `REQUEST_TIMEOUT_SECS` - Per-attempt timeout, 0 = default (default: 30)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per request (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials {
            consumer_key: required("API_CONSUMER_KEY")?,
            consumer_secret: required("API_CONSUMER_SECRET")?,
            access_token: required("API_ACCESS_TOKEN")?,
            access_token_secret: required("API_ACCESS_TOKEN_SECRET")?,
        };

        let defaults = CacheSettings::default();
        let cache = CacheSettings {
            max_entries: parsed("CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            albums_ttl: parsed("CACHE_ALBUMS_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.albums_ttl),
            images_ttl: parsed("CACHE_IMAGES_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.images_ttl),
            exif_ttl: parsed::<u64>("CACHE_EXIF_TTL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            sweep_interval: parsed("CACHE_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parsed::<u32>("RETRY_MAX_ATTEMPTS")
                .map(|n| n.max(1))
                .unwrap_or(retry_defaults.max_attempts),
            base_delay: parsed("RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.base_delay),
            request_timeout: parsed::<u64>("REQUEST_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(retry_defaults.request_timeout),
        };

        Ok(Self {
            credentials,
            account: env::var("API_ACCOUNT").unwrap_or_else(|_| "default".to_string()),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "https://api.smugmug.com".to_string()),
            cache,
            retry,
            server_port: parsed("SERVER_PORT").unwrap_or(3000),
        })
    }
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(GalleryError::Config(format!("{name} must be set"))),
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
