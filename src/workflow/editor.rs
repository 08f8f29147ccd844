//! Single-page edits outside the full pipeline: revise one stored page from a
//! request, or generate and append a new page. Each edit is one model call
//! and one commit.

use super::coder::{self, extract_html};
use super::events::WorkflowStep;
use crate::error::{InputError, PipelineError, StoreError};
use crate::provider::{ChatMessage, Model};
use crate::store::{CanvasPageMeta, CanvasStore, VersionId};
use crate::vcs::VersionControl;
use chrono::Utc;
use tracing::info;

const ITERATE_PROMPT: &str = include_str!("../../prompts/iterate.md");

/// Request text quoted in commit subjects
const COMMIT_PROMPT_CHARS: usize = 50;

const DEFAULT_PAGE_REQUEST: &str =
    "Create a simple landing page with a hero section and feature cards.";

/// Revise page `slot_id` according to `request` and commit the result
pub async fn iterate_page(
    model: &dyn Model,
    store: &dyn CanvasStore,
    vcs: &dyn VersionControl,
    version: &VersionId,
    slot_id: &str,
    request: &str,
) -> Result<CanvasPageMeta, PipelineError> {
    if request.trim().is_empty() {
        return Err(InputError::EmptyPrompt.into());
    }

    let mut meta = store
        .read_meta(version)
        .await?
        .ok_or_else(|| StoreError::CanvasMissing(version.to_string()))?;
    let index = meta
        .pages
        .iter()
        .position(|p| p.id == slot_id)
        .ok_or_else(|| InputError::PageNotFound(slot_id.to_string()))?;

    let current = store.read_page_html(version, slot_id).await?;
    if current.trim().is_empty() {
        return Err(InputError::PageHasNoHtml(slot_id.to_string()).into());
    }

    let message = format!(
        "## Current HTML\n```html\n{}\n```\n\n## Modification Request\n{}",
        current, request
    );
    let raw = model
        .generate_text(ITERATE_PROMPT, &[ChatMessage::user(message)])
        .await
        .map_err(|source| PipelineError::ModelInvocation {
            step: WorkflowStep::Coder,
            source,
        })?;

    store
        .write_page_html(version, slot_id, &extract_html(&raw))
        .await?;

    let now = Utc::now();
    meta.pages[index].updated_at = now;
    meta.updated_at = now;
    store.write_meta(version, &meta).await?;

    let dir = store.version_dir(version);
    vcs.ensure_repo(&dir).await?;
    vcs.commit(&dir, &update_message(request)).await?;

    info!("Updated page {} of {}", slot_id, version);
    Ok(meta.pages.swap_remove(index))
}

/// Generate a new page from the version's spec plus an optional request,
/// append it to the canvas and commit
pub async fn add_page(
    model: &dyn Model,
    store: &dyn CanvasStore,
    vcs: &dyn VersionControl,
    version: &VersionId,
    canvas_name: &str,
    page_name: &str,
    request: Option<&str>,
) -> Result<CanvasPageMeta, PipelineError> {
    if page_name.trim().is_empty() {
        return Err(InputError::EmptyPageName.into());
    }

    let spec = store.read_spec(version).await?;
    let mut meta = store.load_or_create_canvas(version, canvas_name).await?;

    let raw = model
        .generate_text(
            coder::SYSTEM_PROMPT,
            &[ChatMessage::user(add_page_message(spec.as_deref(), request))],
        )
        .await
        .map_err(|source| PipelineError::ModelInvocation {
            step: WorkflowStep::Coder,
            source,
        })?;

    let now = Utc::now();
    let mut page = CanvasPageMeta::new_slot(page_name, request.unwrap_or_default(), now);
    if request.is_none() {
        page.description = None;
    }

    meta.pages.push(page.clone());
    meta.updated_at = now;
    store.write_meta(version, &meta).await?;
    store
        .write_page_html(version, &page.id, &extract_html(&raw))
        .await?;

    let dir = store.version_dir(version);
    vcs.ensure_repo(&dir).await?;
    vcs.commit(&dir, &format!("Add canvas page: {}", page_name))
        .await?;

    info!("Added page {} ({}) to {}", page.id, page_name, version);
    Ok(page)
}

fn add_page_message(spec: Option<&str>, request: Option<&str>) -> String {
    let parts: Vec<String> = [
        spec.filter(|s| !s.trim().is_empty())
            .map(|s| format!("## Product Spec\n{}", s)),
        request
            .filter(|r| !r.trim().is_empty())
            .map(|r| format!("## User Request\n{}", r)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        return DEFAULT_PAGE_REQUEST.to_string();
    }
    parts.join("\n\n")
}

fn update_message(request: &str) -> String {
    let quoted: String = request.chars().take(COMMIT_PROMPT_CHARS).collect();
    if request.chars().count() > COMMIT_PROMPT_CHARS {
        format!("Canvas update: {}...", quoted)
    } else {
        format!("Canvas update: {}", quoted)
    }
}
