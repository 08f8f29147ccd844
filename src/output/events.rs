use crate::error::OutputError;
use crate::workflow::{StepStatus, WorkflowEvent};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// Server-sent events framing
    Sse,
}

/// Render one event as a chunk ready to write, trailing newline(s) included
pub fn render_event(event: &WorkflowEvent, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(format!("{}\n", render_text(event))),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string(event)?)),
        OutputFormat::Sse => Ok(format!(
            "event: {}\ndata: {}\n\n",
            event.name(),
            serde_json::to_string(event)?
        )),
    }
}

fn render_text(event: &WorkflowEvent) -> String {
    match event {
        WorkflowEvent::Step {
            step,
            status,
            detail,
            result,
        } => match (status, detail, result) {
            (StepStatus::Error, Some(detail), _) => format!("[{}] failed: {}", step, detail),
            (_, Some(detail), _) => format!("[{}] {}", step, detail),
            (StepStatus::Complete, None, Some(result)) => format!("[{}] complete {}", step, result),
            (StepStatus::Complete, None, None) => format!("[{}] complete", step),
            (StepStatus::Running, None, _) => format!("[{}] running", step),
            (StepStatus::Error, None, _) => format!("[{}] failed", step),
        },
        WorkflowEvent::Error { step, error } => format!("Error in {}: {}", step, error),
        WorkflowEvent::Done {
            canvas_id,
            page_count,
        } => format!("Done: canvas {} has {} page(s)", canvas_id, page_count),
    }
}
