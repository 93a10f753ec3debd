//! Configuration management for tally
//!
//! This module handles loading, validation, and management of
//! tally configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the transactions API (endpoint paths are joined onto it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token; when absent the client is treated as logged out
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for the transaction list
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

/// Batch entry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// How long the "saved" acknowledgment stays up before the rows reset
    #[serde(default = "default_success_ack_ms")]
    pub success_ack_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            success_ack_ms: default_success_ack_ms(),
        }
    }
}

fn default_success_ack_ms() -> u64 {
    1500
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency code shown next to amounts
    #[serde(default = "default_currency")]
    pub code: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
        }
    }
}

fn default_currency() -> String {
    "BDT".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Batch entry settings
    #[serde(default)]
    pub batch: BatchConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&content)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound { path }) => {
                log::warn!("Config file {} not found, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.base_url".to_string(),
            });
        }

        if !self.api.base_url.starts_with("http://") {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: "Base URL must start with http://; https is not supported because the client has no TLS, so reach a TLS server through a local proxy".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                reason: "Page size must be greater than 0".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if matches!(self.api.token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: "api.token is set but empty; remove it or provide a token".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Delay before a saved batch resets
    pub fn success_ack(&self) -> Duration {
        Duration::from_millis(self.batch.success_ack_ms)
    }

    /// Whether a session token is configured
    pub fn is_authenticated(&self) -> bool {
        self.api.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.batch.success_ack_ms, 1500);
        assert_eq!(config.currency.code, "BDT");
        assert!(!config.is_authenticated());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bundled_default_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.api.timeout_secs, 15);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml("api:\n  token: abc\npagination:\n  page_size: 25\n").unwrap();
        assert_eq!(config.pagination.page_size, 25);
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api/");
        assert!(config.is_authenticated());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_yaml("pagination:\n  page_size: 0\n").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidValue);
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let err = Config::from_yaml("api:\n  base_url: ftp://example.org\n").unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_https_base_url_rejected_with_tls_hint() {
        let err = Config::from_yaml("api:\n  base_url: https://finance.example.org/api/\n").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidValue);
        assert!(err.to_string().contains("no TLS"));
        assert!(err.suggestions()[0].contains("https is not supported"));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("pagination: [").unwrap_err();
        assert_eq!(err.code(), error::ConfigErrorCode::InvalidYaml);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        assert!(matches!(Config::load(&path), Err(ConfigError::FileNotFound { .. })));
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.pagination.page_size, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch:\n  success_ack_ms: 0\nlogging:\n  level: debug").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.success_ack(), Duration::ZERO);
        assert_eq!(config.logging.level, "debug");
    }
}
