mod events;
mod report;

pub use events::{render_event, OutputFormat};
pub use report::write_quality_report;
