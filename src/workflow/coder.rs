use super::types::{GeneratedPage, Task, TechDesign};
use crate::error::{DecodeError, StageError};
use crate::provider::{ChatMessage, Model};

pub(super) const SYSTEM_PROMPT: &str = include_str!("../../prompts/coder.md");

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Generate one page. Holds no state between calls, so any number can run
/// concurrently.
pub async fn run(
    model: &dyn Model,
    task: &Task,
    design: &TechDesign,
    shared_components: &[String],
) -> Result<GeneratedPage, StageError> {
    let message = build_message(task, design, shared_components)?;
    let raw = model
        .generate_text(SYSTEM_PROMPT, &[ChatMessage::user(message)])
        .await?;

    Ok(GeneratedPage {
        page_id: task.page_id.clone(),
        page_name: task.page_name.clone(),
        html_content: extract_html(&raw),
    })
}

fn build_message(
    task: &Task,
    design: &TechDesign,
    shared_components: &[String],
) -> Result<String, DecodeError> {
    let criteria = task
        .acceptance_criteria
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");

    let design_json = serde_json::to_string_pretty(design).map_err(DecodeError::Encode)?;

    Ok(format!(
        "## Task\n\
        Page ID: {}\n\
        Page Name: {}\n\n\
        Description:\n{}\n\n\
        Acceptance Criteria:\n{}\n\n\
        ## Technical Design\n```json\n{}\n```\n\n\
        ## Shared Components\n{}\n\n\
        Generate a complete, standalone HTML page for this task using Tailwind CSS. \
        The page should meet all acceptance criteria and follow the design guidelines provided.",
        task.page_id,
        task.page_name,
        task.description,
        criteria,
        design_json,
        shared_component_list(design, shared_components)
    ))
}

/// Shared components with their purpose from the design; all design
/// components when the plan names none
fn shared_component_list(design: &TechDesign, shared: &[String]) -> String {
    if shared.is_empty() {
        return design
            .components
            .iter()
            .map(|c| format!("- {}: {}", c.name, c.purpose))
            .collect::<Vec<_>>()
            .join("\n");
    }

    shared
        .iter()
        .map(|name| match design.components.iter().find(|c| &c.name == name) {
            Some(c) => format!("- {}: {}", c.name, c.purpose),
            None => format!("- {}", name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull the HTML document out of a completion.
///
/// A doctype wins, then an `<html>...</html>` span (given a doctype), then
/// the trimmed reply as-is. Nothing checks that the result is valid HTML.
pub fn extract_html(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();

    if let Some(start) = lower.find("<!doctype html>") {
        return text[start..].trim().to_string();
    }

    if let (Some(start), Some(end)) = (lower.find("<html"), lower.rfind("</html>")) {
        if end > start {
            return format!("{}\n{}", DOCTYPE, &text[start..end + "</html>".len()]);
        }
    }

    text.trim().to_string()
}
