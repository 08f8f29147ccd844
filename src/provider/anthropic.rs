use super::{ChatMessage, Model, Role};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicModel {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().build()?;
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            endpoint: format!("{}/messages", base.trim_end_matches('/')),
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }
}

#[async_trait]
impl Model for AnthropicModel {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
        };

        debug!(provider = "anthropic", model = %self.model, "Invoking Anthropic backend");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        collect_text(parsed)
    }
}

fn collect_text(response: MessagesResponse) -> Result<String, ProviderError> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(ProviderError::EmptyResponse(
            "Anthropic response has no text blocks".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_blocks_are_joined() {
        let raw = r#"{"content":[{"type":"text","text":"{\"a\":"},{"type":"tool_use","id":"x"},{"type":"text","text":"1}"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(collect_text(parsed).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_no_text_is_an_error() {
        let parsed: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(
            collect_text(parsed),
            Err(ProviderError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_endpoint_from_custom_base() {
        let model = AnthropicModel::new(
            "k".into(),
            Some("https://proxy.local/v1/".into()),
            "m".into(),
            100,
            0.0,
        )
        .unwrap();
        assert_eq!(model.endpoint, "https://proxy.local/v1/messages");
    }
}
