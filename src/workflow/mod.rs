//! The four-stage canvas workflow: architect, planner, coder, reviewer.

mod architect;
mod coder;
mod editor;
mod events;
mod pipeline;
mod planner;
mod reviewer;
mod structured;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use editor::{add_page, iterate_page};
pub use events::{StepStatus, WorkflowEvent, WorkflowStep};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};
pub use structured::schema_value;
pub use types::{
    GeneratedPage, ImplementationPlan, PageReview, QualityReport, TechDesign, MAX_DESIGN_PAGES,
};
