//! Git plumbing for canvas versions: init, commit, log and single-file checkout.

use crate::config::GitConfig;
use crate::error::VcsError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Component, Path};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub date: String,
    pub author: String,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Initialise a repository at `path` unless one already exists
    async fn ensure_repo(&self, path: &Path) -> Result<(), VcsError>;

    /// Stage everything and commit; a clean tree is a no-op
    async fn commit(&self, path: &Path, message: &str) -> Result<(), VcsError>;

    async fn log(&self, path: &Path, limit: usize) -> Result<Vec<CommitInfo>, VcsError>;

    /// Restore one file from `rev`
    async fn checkout(&self, path: &Path, file: &str, rev: &str) -> Result<(), VcsError>;
}

pub struct GitRepo {
    user_name: String,
    user_email: String,
}

impl GitRepo {
    pub fn new(config: &GitConfig) -> Self {
        Self {
            user_name: config.user_name.clone(),
            user_email: config.user_email.clone(),
        }
    }

    pub fn is_repo(path: &Path) -> bool {
        path.join(".git").exists()
    }

    async fn git(&self, path: &Path, args: &[&str]) -> Result<String, VcsError> {
        debug!("git {} (in {})", args.join(" "), path.display());
        let output = Command::new("git").args(args).current_dir(path).output().await?;

        if !output.status.success() {
            return Err(VcsError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn require_repo(path: &Path) -> Result<(), VcsError> {
        if Self::is_repo(path) {
            Ok(())
        } else {
            Err(VcsError::NotARepository(path.to_path_buf()))
        }
    }
}

#[async_trait]
impl VersionControl for GitRepo {
    async fn ensure_repo(&self, path: &Path) -> Result<(), VcsError> {
        if Self::is_repo(path) {
            return Ok(());
        }

        tokio::fs::create_dir_all(path).await?;
        self.git(path, &["init"]).await?;
        self.git(path, &["config", "user.email", self.user_email.as_str()])
            .await?;
        self.git(path, &["config", "user.name", self.user_name.as_str()])
            .await?;

        tokio::fs::write(path.join(".gitkeep"), "").await?;
        self.git(path, &["add", ".gitkeep"]).await?;
        self.git(path, &["commit", "-m", "Initial commit"]).await?;

        // Branch might already be main
        if let Err(e) = self.git(path, &["branch", "-M", "main"]).await {
            debug!("Could not rename branch to main: {}", e);
        }

        info!("Initialized git repository at {}", path.display());
        Ok(())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<(), VcsError> {
        Self::require_repo(path)?;

        self.git(path, &["add", "-A"]).await?;
        let status = self.git(path, &["status", "--porcelain"]).await?;
        if status.trim().is_empty() {
            debug!("Nothing to commit in {}", path.display());
            return Ok(());
        }

        self.git(path, &["commit", "-m", message]).await?;
        info!("Committed: {}", message);
        Ok(())
    }

    async fn log(&self, path: &Path, limit: usize) -> Result<Vec<CommitInfo>, VcsError> {
        Self::require_repo(path)?;

        let count = format!("-{}", limit);
        let stdout = self
            .git(path, &["log", count.as_str(), "--pretty=format:%H|%s|%aI|%an"])
            .await?;
        Ok(parse_log(&stdout))
    }

    async fn checkout(&self, path: &Path, file: &str, rev: &str) -> Result<(), VcsError> {
        Self::require_repo(path)?;

        if rev.trim().is_empty() || rev.starts_with('-') {
            return Err(VcsError::InvalidRef(rev.to_string()));
        }
        validate_relative_path(file)?;

        self.git(path, &["checkout", rev, "--", file]).await?;
        Ok(())
    }
}

/// Parse `%H|%s|%aI|%an` lines; the subject may itself contain `|`
fn parse_log(stdout: &str) -> Vec<CommitInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let (hash, rest) = line.split_once('|')?;
            let mut tail = rest.rsplitn(3, '|');
            let author = tail.next()?;
            let date = tail.next()?;
            let message = tail.next()?;
            if hash.is_empty() {
                return None;
            }
            Some(CommitInfo {
                hash: hash.to_string(),
                message: message.to_string(),
                date: date.to_string(),
                author: author.to_string(),
            })
        })
        .collect()
}

fn validate_relative_path(file: &str) -> Result<(), VcsError> {
    let path = Path::new(file);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if file.is_empty() || escapes {
        return Err(VcsError::InvalidPath(file.to_string()));
    }
    Ok(())
}
