//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `cache_prefix` or `cache_version` is empty
    /// - `seed_urls` is empty or holds anything but absolute paths
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `update_check_interval_secs` is below 10 seconds
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.cache_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        if self.seed_urls.is_empty() {
            return Err(ConfigError::Invalid {
                field: "seed_urls".into(),
                reason: "must list at least one path".into(),
            });
        }
        if let Some(seed) = self.seed_urls.iter().find(|s| !s.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "seed_urls".into(),
                reason: format!("{seed:?} is not an absolute path"),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.update_check_interval_secs < 10 {
            return Err(ConfigError::Invalid {
                field: "update_check_interval_secs".into(),
                reason: "must be at least 10 seconds".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.auto_skip_waiting && !self.update_check_enabled {
            tracing::warn!("auto_skip_waiting is set but update_check_enabled is false; it has no effect");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &AppConfig) -> Option<String> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("origin"));
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { cache_version: "  ".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("cache_version"));

        let config = AppConfig { cache_prefix: String::new(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("cache_prefix"));
    }

    #[test]
    fn test_validate_seed_urls() {
        let config = AppConfig { seed_urls: Vec::new(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("seed_urls"));

        let config = AppConfig { seed_urls: vec!["/".into(), "manifest.json".into()], ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("seed_urls"));
    }

    #[test]
    fn test_validate_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("max_bytes"));

        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("max_bytes"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_update_interval() {
        let config = AppConfig { update_check_interval_secs: 1, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("update_check_interval_secs"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            max_bytes: 1,
            timeout_ms: 100,
            update_check_interval_secs: 10,
            seed_urls: vec!["/".into()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
