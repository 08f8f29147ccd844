use super::{render_transcript, ChatMessage, Model};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct CodexRunner {
    pub binary: PathBuf,
    pub model: String,
}

#[async_trait]
impl Model for CodexRunner {
    fn name(&self) -> &'static str {
        "codex_cli"
    }

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        // Codex has no system prompt flag, so instructions lead the prompt
        let full_prompt = format!("{}\n\n---\n\n{}", system, render_transcript(messages));

        // Capture final assistant message to a temp file
        let out_file = NamedTempFile::new()?;
        let out_path = out_file.path().to_path_buf();

        let binary_str = self.binary.to_string_lossy();
        let mut cmd = if binary_str.contains('/') || binary_str.contains('\\') {
            Command::new(&self.binary)
        } else {
            Command::new(binary_str.as_ref())
        };

        cmd.arg("exec")
            .arg("--model")
            .arg(&self.model)
            .arg("--output-last-message")
            .arg(&out_path)
            // Read prompt from stdin
            .arg("-");

        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(full_prompt.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let last_message = tokio::fs::read_to_string(&out_path).await.unwrap_or_default();
        if last_message.trim().is_empty() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Ok(last_message)
        }
    }
}
