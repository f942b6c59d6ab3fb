//! Server configuration.
//!
//! Read from an optional YAML file (`WEBHOOK_CONFIG`), then overridden by
//! environment variables:
//!   WEBHOOK_HOST                  - listen host (default: 0.0.0.0)
//!   WEBHOOK_PORT                  - listen port (default: 8090)
//!   WEBHOOK_VERIFY_CERT           - verify the platform's TLS certificate (default: true)
//!   WEBHOOK_DEBUG                 - verbose logging and error detail in responses (default: false)
//!   WEBHOOK_HANDLER_TIMEOUT_SECS  - upper bound on one handler run (default: 60)
//!   WEBHOOK_PLATFORM_TIMEOUT_SECS - upper bound on one platform call (default: 30)
//!   WEBHOOK_PLATFORM_URL          - platform API URL when the request carries none

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "WEBHOOK_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for the webhook server process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub host: String,
    pub port: u16,
    /// When false, the platform's TLS certificate is not verified.
    pub verify_platform_cert: bool,
    pub debug: bool,
    pub handler_timeout_secs: u64,
    pub platform_timeout_secs: u64,
    pub platform_url: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            verify_platform_cert: true,
            debug: false,
            handler_timeout_secs: 60,
            platform_timeout_secs: 30,
            platform_url: None,
        }
    }
}

impl WebhookConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: WebhookConfig = serde_yaml::from_str(content)?;
        config.validate()
    }

    /// File (if `WEBHOOK_CONFIG` is set) plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `WEBHOOK_*` overrides obtained from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WEBHOOK_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("WEBHOOK_PORT") {
            self.port = parse_value("WEBHOOK_PORT", &port)?;
        }
        if let Some(verify) = lookup("WEBHOOK_VERIFY_CERT") {
            self.verify_platform_cert = parse_bool("WEBHOOK_VERIFY_CERT", &verify)?;
        }
        if let Some(debug) = lookup("WEBHOOK_DEBUG") {
            self.debug = parse_bool("WEBHOOK_DEBUG", &debug)?;
        }
        if let Some(secs) = lookup("WEBHOOK_HANDLER_TIMEOUT_SECS") {
            self.handler_timeout_secs = parse_value("WEBHOOK_HANDLER_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("WEBHOOK_PLATFORM_TIMEOUT_SECS") {
            self.platform_timeout_secs = parse_value("WEBHOOK_PLATFORM_TIMEOUT_SECS", &secs)?;
        }
        if let Some(url) = lookup("WEBHOOK_PLATFORM_URL") {
            self.platform_url = Some(url).filter(|u| !u.is_empty());
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.handler_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "handler_timeout_secs".into(),
                value: "0".into(),
                reason: "must be at least one second".into(),
            });
        }
        if self.platform_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "platform_timeout_secs".into(),
                value: "0".into(),
                reason: "must be at least one second".into(),
            });
        }
        Ok(self)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }

    pub fn platform_timeout(&self) -> Duration {
        Duration::from_secs(self.platform_timeout_secs)
    }

    /// Default tracing filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "eln_webhooks=debug,webhook_server=debug,webhook_core=debug,tower_http=debug"
        } else {
            "eln_webhooks=info,webhook_server=info,webhook_core=info,tower_http=info"
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}
