use super::{render_transcript, ChatMessage, Model};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct ClaudeRunner {
    pub binary: PathBuf,
    pub model: String,
}

#[async_trait]
impl Model for ClaudeRunner {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let prompt = render_transcript(messages);

        // Build command - use string for PATH lookup if not an absolute/relative path
        let binary_str = self.binary.to_string_lossy();
        let mut cmd = if binary_str.contains('/') || binary_str.contains('\\') {
            Command::new(&self.binary)
        } else {
            Command::new(binary_str.as_ref())
        };

        // Ensure subscription auth is used (not API key)
        cmd.env_remove("ANTHROPIC_API_KEY");

        cmd.arg("-p")
            .arg(&prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--system-prompt")
            .arg(system)
            .arg("--output-format")
            .arg("json");

        let start = std::time::Instant::now();
        let output = cmd.output().await?;

        if !output.status.success() {
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        debug!("claude_cli completed in {:?}", start.elapsed());
        Ok(unwrap_result(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Claude wraps the reply in {"result": "...", ...}; fall back to raw stdout
fn unwrap_result(stdout: &str) -> String {
    #[derive(Deserialize)]
    struct ClaudeOutput {
        result: String,
    }

    match serde_json::from_str::<ClaudeOutput>(stdout.trim()) {
        Ok(out) => out.result,
        Err(_) => stdout.to_string(),
    }
}
