// Upstream client implementation
// One bounded POST per inbound request, no retries

use axum::body::Bytes;
use reqwest::{header, Client};
use serde::de::IgnoredAny;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::proxy::config::{UpstreamConfig, UpstreamProxyConfig};
use crate::proxy::error::RelayError;
use crate::proxy::mappers::chat::UpstreamChatRequest;

pub struct UpstreamClient {
    http_client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig, proxy_config: &UpstreamProxyConfig) -> AppResult<Self> {
        // Timeouts are enforced per call through the cancellation token
        let mut builder = Client::builder();

        if proxy_config.enabled && !proxy_config.url.is_empty() {
            let proxy = reqwest::Proxy::all(&proxy_config.url)?;
            builder = builder.proxy(proxy);
            tracing::info!("UpstreamClient enabled proxy: {}", proxy_config.url);
        } else {
            builder = builder.no_proxy();
        }

        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Call the chat-completions endpoint, racing it against a timer-driven
    /// cancellation token.
    ///
    /// On success returns the upstream body bytes untouched, after checking
    /// that they parse as JSON.
    pub async fn chat_completions(&self, body: &UpstreamChatRequest) -> Result<Bytes, RelayError> {
        let cancel = CancellationToken::new();
        let timer = {
            let cancel = cancel.clone();
            let timeout = self.config.timeout();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::error!("Request timeout after {} seconds", self.config.request_timeout);
                Err(RelayError::Timeout {
                    provider: self.config.name.clone(),
                    secs: self.config.request_timeout,
                })
            }
            res = self.send(body) => res,
        };

        timer.abort();
        result
    }

    async fn send(&self, body: &UpstreamChatRequest) -> Result<Bytes, RelayError> {
        let endpoint = &self.config.endpoint;
        tracing::info!("Calling {} API: {}", self.config.name, endpoint);
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(pretty) = serde_json::to_string_pretty(body) {
                tracing::debug!("Request body: {}", pretty);
            }
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                .map_err(|e| RelayError::Internal(e.to_string()))?,
        );

        let response = self
            .http_client
            .post(endpoint)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Proxy Error: {}", e);
                RelayError::Internal(e.to_string())
            })?;

        let status = response.status();
        tracing::info!("{} response status: {}", self.config.name, status.as_u16());

        if !status.is_success() {
            let error_text = response.text().await.map_err(|e| {
                tracing::error!("Proxy Error: {}", e);
                RelayError::Internal(e.to_string())
            })?;
            tracing::error!(
                "{} API Error: {} {}",
                self.config.name,
                status.as_u16(),
                error_text
            );
            return Err(RelayError::Upstream {
                provider: self.config.name.clone(),
                status: status.as_u16(),
                body: error_text,
                endpoint: endpoint.clone(),
            });
        }

        let data = response.bytes().await.map_err(|e| {
            tracing::error!("Proxy Error: {}", e);
            RelayError::Internal(e.to_string())
        })?;
        serde_json::from_slice::<IgnoredAny>(&data).map_err(|e| {
            tracing::error!("Proxy Error: {}", e);
            RelayError::Internal(e.to_string())
        })?;
        tracing::info!("{} response received successfully", self.config.name);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_rejected() {
        let proxy = UpstreamProxyConfig {
            enabled: true,
            url: "http://[::1".to_string(),
        };
        assert!(UpstreamClient::new(UpstreamConfig::default(), &proxy).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_internal_error() {
        let config = UpstreamConfig {
            endpoint: "http://127.0.0.1:1/v4/chat/completions".to_string(),
            api_key: "k".to_string(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(config, &UpstreamProxyConfig::default()).unwrap();
        let body = UpstreamChatRequest {
            model: "glm-4.5-air".to_string(),
            messages: vec![],
            temperature: 0.7,
            stream: false,
        };
        let err = client.chat_completions(&body).await.unwrap_err();
        assert!(matches!(err, RelayError::Internal(_)));
    }
}
