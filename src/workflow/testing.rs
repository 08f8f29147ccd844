//! In-memory doubles for the model and version-control collaborators.

use super::WorkflowStep;
use crate::error::{ProviderError, VcsError};
use crate::provider::{ChatMessage, Model};
use crate::vcs::{CommitInfo, VersionControl};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Returns the same reply to every call and remembers system prompts
pub struct EchoModel {
    reply: String,
    systems: Mutex<Vec<String>>,
}

impl EchoModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            systems: Mutex::new(Vec::new()),
        }
    }

    pub fn systems(&self) -> Vec<String> {
        self.systems.lock().unwrap().clone()
    }
}

#[async_trait]
impl Model for EchoModel {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn generate_text(
        &self,
        system: &str,
        _messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        self.systems.lock().unwrap().push(system.to_string());
        Ok(self.reply.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub step: WorkflowStep,
    /// Page id for coder calls
    pub page_id: Option<String>,
}

/// Routes each call by its system prompt and answers like the real stages
pub struct StageModel {
    pub design: String,
    pub plan: String,
    /// Coder attempt numbers (1-based) that fail, per page id
    pub coder_failures: HashMap<String, RangeInclusive<usize>>,
    reviews: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Call>>,
    cancel_on: Option<(WorkflowStep, CancellationToken)>,
}

impl StageModel {
    /// Pages `ids` designed and planned one-to-one
    pub fn for_pages(ids: &[&str]) -> Self {
        Self {
            design: design_json(ids),
            plan: plan_json(ids),
            coder_failures: HashMap::new(),
            reviews: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            cancel_on: None,
        }
    }

    /// Queue one reviewer reply
    pub fn with_review(self, scores: &[(&str, f64)]) -> Self {
        self.reviews.lock().unwrap().push_back(review_json(scores));
        self
    }

    pub fn with_raw_review(self, raw: &str) -> Self {
        self.reviews.lock().unwrap().push_back(raw.to_string());
        self
    }

    /// Fail the first `attempts` coder calls for `page_id`
    pub fn failing(mut self, page_id: &str, attempts: usize) -> Self {
        self.coder_failures.insert(page_id.to_string(), 1..=attempts);
        self
    }

    /// Let the first coder call for `page_id` succeed and fail every later one
    pub fn failing_after_first(mut self, page_id: &str) -> Self {
        self.coder_failures.insert(page_id.to_string(), 2..=usize::MAX);
        self
    }

    /// Trip `token` when `step` is first called
    pub fn cancel_during(mut self, step: WorkflowStep, token: CancellationToken) -> Self {
        self.cancel_on = Some((step, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, step: WorkflowStep) -> usize {
        self.calls().iter().filter(|c| c.step == step).count()
    }

    pub fn coder_pages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.page_id)
            .collect()
    }

    fn classify(system: &str) -> WorkflowStep {
        if system.starts_with("You are an expert UI/UX architect") {
            WorkflowStep::Architect
        } else if system.starts_with("You are an expert implementation planner") {
            WorkflowStep::Planner
        } else if system.starts_with("You are a senior frontend code reviewer") {
            WorkflowStep::Reviewer
        } else {
            WorkflowStep::Coder
        }
    }
}

fn page_id_of(messages: &[ChatMessage]) -> Option<String> {
    messages.iter().find_map(|m| {
        m.content
            .lines()
            .find_map(|line| line.strip_prefix("Page ID: "))
            .map(|id| id.trim().to_string())
    })
}

#[async_trait]
impl Model for StageModel {
    fn name(&self) -> &'static str {
        "stage"
    }

    async fn generate_text(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let step = Self::classify(system);
        let page_id = (step == WorkflowStep::Coder)
            .then(|| page_id_of(messages))
            .flatten();

        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                step,
                page_id: page_id.clone(),
            });
            calls
                .iter()
                .filter(|c| c.page_id.is_some() && c.page_id == page_id)
                .count()
        };

        if let Some((cancel_step, token)) = &self.cancel_on {
            if *cancel_step == step {
                token.cancel();
            }
        }

        match step {
            WorkflowStep::Architect => Ok(self.design.clone()),
            WorkflowStep::Planner => Ok(self.plan.clone()),
            WorkflowStep::Reviewer => self
                .reviews
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::EmptyResponse("no review queued".into())),
            WorkflowStep::Coder => {
                let id = page_id.unwrap_or_default();
                let fails = self
                    .coder_failures
                    .get(&id)
                    .is_some_and(|attempts| attempts.contains(&attempt));
                if fails {
                    return Err(ProviderError::Status {
                        status: 529,
                        body: format!("overloaded while generating {}", id),
                    });
                }
                Ok(format!(
                    "Here is the page:\n<!DOCTYPE html>\n<html><body><h1>{} v{}</h1></body></html>",
                    id, attempt
                ))
            }
        }
    }
}

pub fn design_json(ids: &[&str]) -> String {
    let pages: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("{} page", id),
                "description": format!("The {} screen", id),
                "layout": "single column"
            })
        })
        .collect();

    json!({
        "pages": pages,
        "components": [{"name": "NavBar", "purpose": "Top navigation", "props": ["items"], "placement": "top"}],
        "designTokens": {"primaryColor": "#2563eb", "fontFamily": "Inter", "spacing": "4px grid"},
        "dataFlow": "Cart state in localStorage",
        "navigationType": "tabs"
    })
    .to_string()
}

pub fn plan_json(ids: &[&str]) -> String {
    let tasks: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "pageId": id,
                "pageName": format!("{} page", id),
                "description": format!("Build the {} screen", id),
                "acceptanceCriteria": ["Responsive", "Uses NavBar"],
                "priority": i + 1
            })
        })
        .collect();

    json!({
        "tasks": tasks,
        "sharedComponents": ["NavBar"],
        "implementationOrder": ids
    })
    .to_string()
}

pub fn review_json(scores: &[(&str, f64)]) -> String {
    let reviews: Vec<_> = scores
        .iter()
        .map(|(id, score)| {
            json!({"pageId": id, "score": score, "issues": [], "suggestions": []})
        })
        .collect();
    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|(_, s)| s).sum::<f64>() / scores.len() as f64
    };

    json!({
        "overallScore": overall,
        "pageReviews": reviews,
        "passesThreshold": overall >= 7.0
    })
    .to_string()
}

/// Records commits instead of running git
#[derive(Default)]
pub struct RecordingVcs {
    commits: Mutex<Vec<(PathBuf, String)>>,
    repos: Mutex<Vec<PathBuf>>,
    pub fail_commit: bool,
}

impl RecordingVcs {
    pub fn failing() -> Self {
        Self {
            fail_commit: true,
            ..Self::default()
        }
    }

    pub fn commits(&self) -> Vec<(PathBuf, String)> {
        self.commits.lock().unwrap().clone()
    }

    pub fn repos(&self) -> Vec<PathBuf> {
        self.repos.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionControl for RecordingVcs {
    async fn ensure_repo(&self, path: &Path) -> Result<(), VcsError> {
        self.repos.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<(), VcsError> {
        if self.fail_commit {
            return Err(VcsError::Git {
                command: "commit".into(),
                stderr: "index.lock exists".into(),
            });
        }
        self.commits
            .lock()
            .unwrap()
            .push((path.to_path_buf(), message.to_string()));
        Ok(())
    }

    async fn log(&self, _path: &Path, _limit: usize) -> Result<Vec<CommitInfo>, VcsError> {
        Ok(Vec::new())
    }

    async fn checkout(&self, _path: &Path, _file: &str, _rev: &str) -> Result<(), VcsError> {
        Ok(())
    }
}
