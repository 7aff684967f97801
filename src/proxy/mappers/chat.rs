// Chat-completion request shapes (browser-facing and upstream-facing)
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proxy::config::UpstreamConfig;
use crate::proxy::error::RelayError;

/// Inbound body posted by the browser client.
///
/// Message entries are carried opaquely; only the container shape is checked.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Body sent to the upstream chat-completions endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
    pub stream: bool,
}

impl ChatRequest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RelayError> {
        let body: Value = serde_json::from_slice(bytes).map_err(|_| RelayError::InvalidMessages)?;
        Self::from_value(body)
    }

    /// `messages` must be present and an array before anything else is read.
    pub fn from_value(body: Value) -> Result<Self, RelayError> {
        if !matches!(body.get("messages"), Some(Value::Array(_))) {
            return Err(RelayError::InvalidMessages);
        }
        serde_json::from_value(body).map_err(|e| RelayError::InvalidRequest(e.to_string()))
    }

    /// Fill in upstream defaults. An empty model name counts as absent.
    pub fn into_upstream(self, upstream: &UpstreamConfig) -> UpstreamChatRequest {
        let model = self
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| upstream.default_model.clone());

        UpstreamChatRequest {
            model,
            messages: self.messages,
            temperature: self.temperature.unwrap_or(upstream.default_temperature),
            stream: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_missing_or_non_array_messages() {
        for body in [
            json!({}),
            json!({ "messages": null }),
            json!({ "messages": "hello" }),
            json!({ "messages": { "role": "user" } }),
            json!([{ "role": "user", "content": "hi" }]),
            json!("messages"),
        ] {
            assert!(matches!(
                ChatRequest::from_value(body),
                Err(RelayError::InvalidMessages)
            ));
        }
        assert!(matches!(
            ChatRequest::from_slice(b"not json"),
            Err(RelayError::InvalidMessages)
        ));
        assert!(matches!(
            ChatRequest::from_slice(b""),
            Err(RelayError::InvalidMessages)
        ));
    }

    #[test]
    fn test_rejects_wrongly_typed_overrides() {
        let err = ChatRequest::from_value(json!({ "messages": [], "model": 42 })).unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));

        let err =
            ChatRequest::from_value(json!({ "messages": [], "temperature": "hot" })).unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));
    }

    #[test]
    fn test_messages_are_not_inspected() {
        let req = ChatRequest::from_value(json!({
            "messages": [1, "two", { "role": "user", "content": "hi" }],
            "extra": true
        }))
        .unwrap();
        assert_eq!(req.messages.len(), 3);
    }

    #[test]
    fn test_defaults_applied() {
        let upstream = UpstreamConfig::default();
        let req = ChatRequest::from_value(json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "model": "",
            "temperature": null
        }))
        .unwrap();

        let out = req.into_upstream(&upstream);
        assert_eq!(out.model, "glm-4.5-air");
        assert_eq!(out.temperature, 0.7);
        assert!(!out.stream);
    }

    #[test]
    fn test_overrides_kept() {
        let upstream = UpstreamConfig::default();
        let req = ChatRequest::from_value(json!({
            "messages": [],
            "model": "glm-4.6",
            "temperature": 0
        }))
        .unwrap();

        let out = serde_json::to_value(req.into_upstream(&upstream)).unwrap();
        assert_eq!(
            out,
            json!({ "model": "glm-4.6", "messages": [], "temperature": 0.0, "stream": false })
        );
    }
}
