use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_ENDPOINT: &str = "https://api.z.ai/api/paas/v4/chat/completions";
pub const DEFAULT_MODEL: &str = "glm-4.5-air";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Relay service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Whether to accept connections from the local network
    /// - false: only 127.0.0.1 (default)
    /// - true: 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chat-completion upstream
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Outbound proxy used to reach the upstream
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Chat-completion upstream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Display name used in error messages
    pub name: String,
    pub endpoint: String,
    /// Bearer credential. Never has a default.
    pub api_key: String,
    pub default_model: String,
    pub default_temperature: f64,
    /// Upstream request timeout (seconds)
    pub request_timeout: u64,
}

/// Upstream proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            upstream: UpstreamConfig::default(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            name: "z.ai".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    25
}

impl RelayConfig {
    /// Get the actual listening address
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }

    /// Reject configurations the relay cannot serve with.
    pub fn validate(&self) -> AppResult<()> {
        let upstream = &self.upstream;

        if upstream.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "upstream api_key is not set (use ZAI_API_KEY or the config file)".to_string(),
            ));
        }

        let endpoint = Url::parse(&upstream.endpoint).map_err(|e| {
            AppError::Config(format!("invalid upstream endpoint {}: {}", upstream.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "upstream endpoint must be http(s): {}",
                upstream.endpoint
            )));
        }

        if upstream.request_timeout == 0 {
            return Err(AppError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }

        if !upstream.default_temperature.is_finite()
            || !(0.0..=2.0).contains(&upstream.default_temperature)
        {
            return Err(AppError::Config(format!(
                "default_temperature out of range [0, 2]: {}",
                upstream.default_temperature
            )));
        }

        if self.upstream_proxy.enabled {
            Url::parse(&self.upstream_proxy.url).map_err(|e| {
                AppError::Config(format!(
                    "invalid upstream proxy url {}: {}",
                    self.upstream_proxy.url, e
                ))
            })?;
        }

        Ok(())
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.upstream.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = RelayConfig::default();
        assert_eq!(config.upstream.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.upstream.default_model, "glm-4.5-air");
        assert_eq!(config.upstream.default_temperature, 0.7);
        assert_eq!(config.upstream.timeout(), Duration::from_secs(25));
        assert!(config.upstream.api_key.is_empty());
    }

    #[test]
    fn test_bind_address() {
        let mut config = RelayConfig::default();
        assert_eq!(config.get_bind_address(), "127.0.0.1");
        config.allow_lan_access = true;
        assert_eq!(config.get_bind_address(), "0.0.0.0");
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());
        assert!(RelayConfig::default().validate().is_err());

        let mut config = valid_config();
        config.upstream.endpoint = "ftp://example.com/chat".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.upstream.request_timeout = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.upstream.default_temperature = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.upstream_proxy = UpstreamProxyConfig {
            enabled: true,
            url: "not a url".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{"upstream": {"api_key": "k", "request_timeout": 5}}"#)
                .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream.api_key, "k");
        assert_eq!(config.upstream.request_timeout, 5);
        assert_eq!(config.upstream.default_model, DEFAULT_MODEL);
        assert!(!config.upstream_proxy.enabled);
    }
}
