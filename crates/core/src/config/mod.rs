//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the app shell; relative request paths resolve against it
    /// and responses from it are treated as same-origin.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Cache store name prefix.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag of the current generation.
    ///
    /// Set via SHELLCACHE_CACHE_VERSION environment variable. Bumping it
    /// installs a new generation and retires the old one on activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Absolute paths fetched and stored when a generation is installed.
    #[serde(default = "default_seed_urls")]
    pub seed_urls: Vec<String>,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes accepted per fetch.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Activate right after install even if another generation is active.
    #[serde(default)]
    pub auto_activate: bool,

    /// Whether the background update checker runs.
    #[serde(default = "default_true")]
    pub update_check_enabled: bool,

    /// Seconds between update checks.
    #[serde(default = "default_update_check_interval_secs")]
    pub update_check_interval_secs: u64,

    /// Send SKIP_WAITING to the manager when a new bundle is detected.
    #[serde(default)]
    pub auto_skip_waiting: bool,

    /// Maximum body bytes echoed back by the offline_fetch tool.
    #[serde(default = "default_max_preview_bytes")]
    pub max_preview_bytes: usize,
}

fn default_origin() -> String {
    "https://app.mytender.io".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_cache_prefix() -> String {
    "mytender-cache".into()
}

fn default_cache_version() -> String {
    "v2".into()
}

fn default_seed_urls() -> Vec<String> {
    vec![
        "/".into(),
        "/manifest.json".into(),
        "/images/mytender.io_badge.png".into(),
        "/images/mytender.io_badge_notification.png".into(),
    ]
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_true() -> bool {
    true
}

fn default_update_check_interval_secs() -> u64 {
    300
}

fn default_max_preview_bytes() -> usize {
    16_384
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            seed_urls: default_seed_urls(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            auto_activate: false,
            update_check_enabled: true,
            update_check_interval_secs: default_update_check_interval_secs(),
            auto_skip_waiting: false,
            max_preview_bytes: default_max_preview_bytes(),
        }
    }
}

impl AppConfig {
    /// Name of the current generation's store, e.g. `mytender-cache-v2`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Parsed app origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Update check interval as Duration.
    pub fn update_check_interval(&self) -> Duration {
        Duration::from_secs(self.update_check_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
