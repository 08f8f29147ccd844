use super::structured;
use super::types::{ImplementationPlan, TechDesign};
use crate::error::{DecodeError, StageError};
use crate::provider::{ChatMessage, Model};
use tracing::info;

const SYSTEM_PROMPT: &str = include_str!("../../prompts/planner.md");

/// Technical design to one task per page. No repair happens here; the
/// pipeline checks the task/page correspondence.
pub async fn run(model: &dyn Model, design: &TechDesign) -> Result<ImplementationPlan, StageError> {
    let design_json = serde_json::to_string(design).map_err(DecodeError::Encode)?;
    let plan: ImplementationPlan =
        structured::generate(model, SYSTEM_PROMPT, &[ChatMessage::user(design_json)]).await?;

    info!(
        "Planner produced {} tasks, {} shared components",
        plan.tasks.len(),
        plan.shared_components.len()
    );
    Ok(plan)
}
