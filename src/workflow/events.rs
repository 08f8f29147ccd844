use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    Architect,
    Planner,
    Coder,
    Reviewer,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStep::Architect => write!(f, "architect"),
            WorkflowStep::Planner => write!(f, "planner"),
            WorkflowStep::Coder => write!(f, "coder"),
            WorkflowStep::Reviewer => write!(f, "reviewer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Complete,
    Error,
}

/// Progress event, serialized as `{"event": "step" | "error" | "done", ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WorkflowEvent {
    Step {
        step: WorkflowStep,
        status: StepStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    Error {
        step: WorkflowStep,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    Done { canvas_id: String, page_count: usize },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Step { .. } => "step",
            WorkflowEvent::Error { .. } => "error",
            WorkflowEvent::Done { .. } => "done",
        }
    }
}

/// Sending half handed to the pipeline. A dropped receiver only means nobody
/// is listening, so send failures are ignored.
pub(crate) struct EventSink {
    tx: UnboundedSender<WorkflowEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<WorkflowEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn running(&self, step: WorkflowStep) {
        self.send(WorkflowEvent::Step {
            step,
            status: StepStatus::Running,
            detail: None,
            result: None,
        });
    }

    pub fn detail(&self, step: WorkflowStep, detail: String) {
        self.send(WorkflowEvent::Step {
            step,
            status: StepStatus::Running,
            detail: Some(detail),
            result: None,
        });
    }

    pub fn complete(&self, step: WorkflowStep, result: Value) {
        self.send(WorkflowEvent::Step {
            step,
            status: StepStatus::Complete,
            detail: None,
            result: Some(result),
        });
    }

    /// Mark the step failed, then emit the terminal error
    pub fn failed(&self, step: WorkflowStep, message: String) {
        self.send(WorkflowEvent::Step {
            step,
            status: StepStatus::Error,
            detail: Some(message.clone()),
            result: None,
        });
        self.send(WorkflowEvent::Error {
            step,
            error: message,
        });
    }

    pub fn done(&self, canvas_id: String, page_count: usize) {
        self.send(WorkflowEvent::Done {
            canvas_id,
            page_count,
        });
    }
}
