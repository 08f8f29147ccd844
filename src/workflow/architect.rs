use super::structured;
use super::types::{TechDesign, MAX_DESIGN_PAGES};
use crate::error::StageError;
use crate::provider::{ChatMessage, Model};
use tracing::info;

const SYSTEM_PROMPT: &str = include_str!("../../prompts/architect.md");

/// Spec text to technical design, capped at `max_pages` pages (never more
/// than [`MAX_DESIGN_PAGES`])
pub async fn run(
    model: &dyn Model,
    spec: &str,
    max_pages: usize,
) -> Result<TechDesign, StageError> {
    if spec.trim().is_empty() {
        return Err(StageError::EmptySpec);
    }

    let max_pages = max_pages.clamp(1, MAX_DESIGN_PAGES);
    let system = SYSTEM_PROMPT.replace("{{MAX_PAGES}}", &max_pages.to_string());
    let design: TechDesign =
        structured::generate(model, &system, &[ChatMessage::user(spec)]).await?;

    // The prompt asks for the cap but models do not always honour it
    design.check(max_pages)?;

    info!(
        "Architect designed {} pages with {:?} navigation",
        design.pages.len(),
        design.navigation_type
    );
    Ok(design)
}
