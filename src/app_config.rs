//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with BROADSHEET_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! The defaults match the documented moderation behavior; deployments only
//! need a config file to tune thresholds or cache lifetimes.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Spam detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Enable spam detection
    pub enabled: bool,
    /// Occurrences of "http" allowed before flagging
    pub max_links: u32,
    /// Uppercase fraction of alphabetic characters allowed before flagging
    pub max_uppercase_ratio: f32,
    /// Minimum trimmed content length in characters
    pub min_content_chars: u32,
    /// Other comments allowed from the same IP before flagging
    pub max_comments_per_ip: i64,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_links: 3,
            max_uppercase_ratio: 0.5,
            min_content_chars: 3,
            max_comments_per_ip: 10,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub capacity: u64,
    /// TTL for per-comment spam-check results, in seconds
    pub spam_ttl_seconds: u64,
    /// TTL for per-IP comment counts, in seconds
    pub ip_count_ttl_seconds: u64,
    /// TTL for approved/rejected aggregate counts, in seconds
    pub status_count_ttl_seconds: u64,
    /// TTL for the pending aggregate count, in seconds (feeds the live
    /// moderation queue, so it expires faster)
    pub pending_count_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            spam_ttl_seconds: 300,
            ip_count_ttl_seconds: 600,
            status_count_ttl_seconds: 900,
            pending_count_ttl_seconds: 300,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub spam: SpamConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (BROADSHEET_ prefix)
            // e.g., BROADSHEET_SPAM_ENABLED, BROADSHEET_CACHE_CAPACITY
            .add_source(
                Environment::with_prefix("BROADSHEET")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        if let Ok(mut config) = APP_CONFIG.write() {
            *config = new_config;
            log::info!("Configuration reloaded");
        }
        Ok(())
    }
}

// Convenience functions for accessing global config

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get spam heuristic thresholds
pub fn spam_rules() -> SpamConfig {
    get_config().spam
}

/// Whether spam detection is enabled at all
pub fn spam_detection_enabled() -> bool {
    get_config().spam.enabled
}

/// Get the cache entry bound
pub fn cache_capacity() -> u64 {
    get_config().cache.capacity
}

/// Get the cache lifetimes as durations
pub fn cache_ttl() -> crate::cache::CacheTtl {
    let cache = get_config().cache;
    crate::cache::CacheTtl {
        spam_result: Duration::from_secs(cache.spam_ttl_seconds),
        ip_count: Duration::from_secs(cache.ip_count_ttl_seconds),
        status_count: Duration::from_secs(cache.status_count_ttl_seconds),
        pending_count: Duration::from_secs(cache.pending_count_ttl_seconds),
    }
}
