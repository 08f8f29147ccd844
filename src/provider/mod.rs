mod anthropic;
mod claude;
mod codex;
mod openai;

pub use anthropic::AnthropicModel;
pub use claude::ClaudeRunner;
pub use codex::CodexRunner;
pub use openai::OpenAiModel;

use crate::config::{ModelConfig, Provider, ProvidersConfig};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Single text-completion primitive every stage is built on.
///
/// Implementations must not retry or time out on their own; the caller owns
/// the deadline through its cancellation token.
#[async_trait]
pub trait Model: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}

/// Build the model client once from config
pub fn create_model(
    model: &ModelConfig,
    providers: &ProvidersConfig,
) -> Result<Arc<dyn Model>, ProviderError> {
    let client: Arc<dyn Model> = match model.provider {
        Provider::Anthropic => Arc::new(AnthropicModel::new(
            resolve_api_key(model, "ANTHROPIC_API_KEY", true)?,
            model.base_url.clone(),
            model.model.clone(),
            model.max_tokens,
            model.temperature,
        )?),
        Provider::Openai => Arc::new(OpenAiModel::new(
            resolve_api_key(model, "OPENAI_API_KEY", true)?,
            model.base_url.clone(),
            model.model.clone(),
            model.max_tokens,
            model.temperature,
        )?),
        Provider::Custom => {
            let base_url = model.base_url.clone().ok_or_else(|| {
                ProviderError::Misconfiguration("custom provider requires base_url".to_string())
            })?;
            // Local OpenAI-compatible servers often run without a key
            Arc::new(OpenAiModel::new(
                resolve_api_key(model, "OPENAI_API_KEY", false)?,
                Some(base_url),
                model.model.clone(),
                model.max_tokens,
                model.temperature,
            )?)
        }
        Provider::ClaudeCli => Arc::new(ClaudeRunner {
            binary: providers.claude_cli.binary.clone(),
            model: model.model.clone(),
        }),
        Provider::CodexCli => Arc::new(CodexRunner {
            binary: providers.codex_cli.binary.clone(),
            model: model.model.clone(),
        }),
    };

    tracing::debug!(provider = %model.provider, model = %model.model, "Resolved model client");
    Ok(client)
}

fn resolve_api_key(
    model: &ModelConfig,
    default_env: &str,
    required: bool,
) -> Result<String, ProviderError> {
    if let Some(key) = &model.api_key {
        return Ok(key.clone());
    }

    let env_name = model.api_key_env.as_deref().unwrap_or(default_env);
    match std::env::var(env_name) {
        Ok(key) => Ok(key),
        Err(_) if !required => Ok(String::new()),
        Err(_) => Err(ProviderError::Misconfiguration(format!(
            "API key not found in environment variable '{}'. \
             Set it or configure model.api_key / model.api_key_env.",
            env_name
        ))),
    }
}

/// Flatten a conversation into one prompt for CLI providers
fn render_transcript(messages: &[ChatMessage]) -> String {
    if let [only] = messages {
        if only.role == Role::User {
            return only.content.clone();
        }
    }

    messages
        .iter()
        .map(|m| match m.role {
            Role::User => format!("User:\n{}", m.content),
            Role::Assistant => format!("Assistant:\n{}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
