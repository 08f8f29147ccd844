use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root folder holding `<projectId>/versions/<versionFolder>` trees
    #[serde(default = "default_projects_root")]
    pub projects_root: PathBuf,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_model_id")]
    pub model: String,

    /// Inline key; takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the key (provider default when unset)
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Required for `custom`, optional override otherwise
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model_id(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Anthropic,
    Openai,
    /// Any OpenAI-compatible chat completions endpoint
    Custom,
    ClaudeCli,
    CodexCli,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Openai => write!(f, "openai"),
            Provider::Custom => write!(f, "custom"),
            Provider::ClaudeCli => write!(f, "claude_cli"),
            Provider::CodexCli => write!(f, "codex_cli"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude_cli: ClaudeCliConfig,

    #[serde(default)]
    pub codex_cli: CodexCliConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ClaudeCliConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CodexCliConfig {
    #[serde(default = "default_codex_binary")]
    pub binary: PathBuf,
}

impl Default for CodexCliConfig {
    fn default() -> Self {
        Self {
            binary: default_codex_binary(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct WorkflowConfig {
    /// Minimum acceptable review score, applied to the overall mean and to each page
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default)]
    pub retry_gate: RetryGate,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Name given to a canvas created on first run
    #[serde(default = "default_canvas_name")]
    pub canvas_name: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            max_pages: default_max_pages(),
            retry_gate: RetryGate::default(),
            commit_message: default_commit_message(),
            canvas_name: default_canvas_name(),
        }
    }
}

/// What opens the single retry round after the first review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RetryGate {
    /// Retry whenever any reviewed page scores below the threshold
    #[default]
    PerPage,
    /// Retry only when the overall score misses the threshold
    OverallScore,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GitConfig {
    #[serde(default = "default_git_user_name")]
    pub user_name: String,

    #[serde(default = "default_git_user_email")]
    pub user_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            user_name: default_git_user_name(),
            user_email: default_git_user_email(),
        }
    }
}
