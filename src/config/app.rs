//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::collector::nginx::NginxConfig;

use super::validation::ConfigError;

/// Default collection interval (10 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Minimum collection interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default record channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Collection interval (default: 10s, minimum: 1s).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Record channel capacity (default: 10000).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// nginx collector instances.
    #[serde(default)]
    pub nginx: Vec<NginxConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            nginx: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval < MIN_INTERVAL {
            return Err(ConfigError::Validation(format!(
                "interval must be at least {:?}",
                MIN_INTERVAL
            )));
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "channel_capacity must be positive".to_string(),
            ));
        }

        if self.nginx.is_empty() {
            return Err(ConfigError::Validation(
                "at least one nginx collector must be configured".to_string(),
            ));
        }

        for (index, collector) in self.nginx.iter().enumerate() {
            if collector.urls.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "nginx collector #{index}: urls cannot be empty"
                )));
            }
            for url in &collector.urls {
                Url::parse(url).map_err(|e| {
                    ConfigError::Validation(format!(
                        "nginx collector #{index}: invalid URL '{url}': {e}"
                    ))
                })?;
            }
            if collector.tls.ssl_cert.is_some() != collector.tls.ssl_key.is_some() {
                return Err(ConfigError::Validation(format!(
                    "nginx collector #{index}: ssl_cert and ssl_key must be configured together"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            nginx: vec![NginxConfig::new(["http://localhost/server_status"])],
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_defaults_from_minimal_yaml() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
nginx:
  - urls: ["http://localhost/server_status"]
"#,
        )
        .unwrap();

        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.nginx.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
interval: 30s
channel_capacity: 500
nginx:
  - urls:
      - http://localhost/server_status
      - https://stats.example.com:9443/status
    response_timeout: 2s
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.channel_capacity, 500);
        assert_eq!(config.nginx[0].urls.len(), 2);
        assert_eq!(config.nginx[0].response_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_sub_second_interval() {
        let config = AppConfig {
            interval: Duration::from_millis(100),
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_validate_no_collectors() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_validate_empty_urls() {
        let config = AppConfig {
            nginx: vec![NginxConfig::new(Vec::<String>::new())],
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("urls cannot be empty"));
    }

    #[test]
    fn test_validate_invalid_url() {
        let config = AppConfig {
            nginx: vec![NginxConfig::new(["not a url"])],
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid URL"));
    }

    #[test]
    fn test_validate_cert_without_key() {
        let mut collector = NginxConfig::new(["http://localhost/server_status"]);
        collector.tls.ssl_cert = Some("/etc/ngxmon/cert.pem".into());
        let config = AppConfig {
            nginx: vec![collector],
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("configured together"));
    }
}
