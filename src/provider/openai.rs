use super::{ChatMessage, Model, Role};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completions client; also serves any compatible endpoint.
///
/// Always targets `/chat/completions`, which is what most compatible
/// servers implement.
pub struct OpenAiModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiModel {
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
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }

    fn convert_messages<'a>(system: &'a str, messages: &'a [ChatMessage]) -> Vec<WireMessage<'a>> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system,
        });
        wire.extend(messages.iter().map(|m| WireMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        wire
    }
}

#[async_trait]
impl Model for OpenAiModel {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: Self::convert_messages(system, messages),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        debug!(provider = "openai", model = %self.model, endpoint = %self.endpoint, "Invoking chat completions");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        first_choice_content(parsed)
    }
}

fn first_choice_content(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::EmptyResponse("missing content in choices[0]".to_string()))
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
