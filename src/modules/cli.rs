use clap::Parser;
use std::path::PathBuf;

use crate::proxy::RelayConfig;

/// Command line and environment overrides, applied on top of the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "chat-relay", about = "CORS-enabled chat-completion relay")]
pub struct Cli {
    /// JSON config file (defaults to ~/.chat_relay/relay_config.json if present)
    #[arg(long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "RELAY_PORT")]
    pub port: Option<u16>,
    /// Listen on 0.0.0.0 instead of 127.0.0.1
    #[arg(long, env = "RELAY_ALLOW_LAN")]
    pub allow_lan: Option<bool>,
    #[arg(long, env = "ZAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "ZAI_ENDPOINT")]
    pub endpoint: Option<String>,
    #[arg(long, env = "RELAY_DEFAULT_MODEL")]
    pub default_model: Option<String>,
    #[arg(long, env = "RELAY_DEFAULT_TEMPERATURE")]
    pub default_temperature: Option<f64>,
    /// Upstream timeout in seconds
    #[arg(long, env = "RELAY_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,
    /// Outbound proxy for upstream calls (http://, https://, socks5://)
    #[arg(long, env = "RELAY_UPSTREAM_PROXY")]
    pub upstream_proxy: Option<String>,
    /// Disable the rolling log file
    #[arg(long)]
    pub no_log_file: bool,
}

impl Cli {
    pub fn apply_to(&self, config: &mut RelayConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(allow_lan) = self.allow_lan {
            config.allow_lan_access = allow_lan;
        }

        let upstream = &mut config.upstream;
        if let Some(key) = &self.api_key {
            upstream.api_key = key.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            upstream.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.default_model {
            upstream.default_model = model.clone();
        }
        if let Some(temperature) = self.default_temperature {
            upstream.default_temperature = temperature;
        }
        if let Some(timeout) = self.request_timeout {
            upstream.request_timeout = timeout;
        }

        if let Some(url) = &self.upstream_proxy {
            config.upstream_proxy.enabled = !url.is_empty();
            config.upstream_proxy.url = url.clone();
        }
    }
}
