use super::structured;
use super::types::{GeneratedPage, QualityReport, TechDesign};
use crate::error::{DecodeError, StageError};
use crate::provider::{ChatMessage, Model};
use std::collections::HashSet;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = include_str!("../../prompts/reviewer.md");

/// Score every page against the design.
///
/// The returned report is normalized: reviews for pages that were not
/// submitted are dropped, `overall_score` is the mean of the remaining page
/// scores and `passes_threshold` is derived from it.
pub async fn run(
    model: &dyn Model,
    pages: &[GeneratedPage],
    design: &TechDesign,
    threshold: f64,
) -> Result<QualityReport, StageError> {
    let system = SYSTEM_PROMPT.replace("{{THRESHOLD}}", &threshold.to_string());
    let message = build_message(pages, design)?;

    let report: QualityReport =
        structured::generate(model, &system, &[ChatMessage::user(message)]).await?;
    let report = normalize(report, pages, threshold);

    info!(
        "Reviewer scored {} pages, overall {:.2} (passes: {})",
        report.page_reviews.len(),
        report.overall_score,
        report.passes_threshold
    );
    Ok(report)
}

fn build_message(pages: &[GeneratedPage], design: &TechDesign) -> Result<String, DecodeError> {
    let formatted_pages = pages
        .iter()
        .map(|page| {
            format!(
                "Page ID: {}\nPage Name: {}\nHTML Content:\n```html\n{}\n```\n",
                page.page_id, page.page_name, page.html_content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let design_json = serde_json::to_string_pretty(design).map_err(DecodeError::Encode)?;

    Ok(format!(
        "Technical Design:\n{}\n\nGenerated Pages:\n{}\n\
        Please review each page against the technical design and provide a quality report.",
        design_json, formatted_pages
    ))
}

fn normalize(mut report: QualityReport, pages: &[GeneratedPage], threshold: f64) -> QualityReport {
    let submitted: HashSet<&str> = pages.iter().map(|p| p.page_id.as_str()).collect();

    let before = report.page_reviews.len();
    report
        .page_reviews
        .retain(|r| submitted.contains(r.page_id.as_str()));
    if report.page_reviews.len() < before {
        warn!(
            "Dropped {} reviews for pages that were not submitted",
            before - report.page_reviews.len()
        );
    }

    let mean = if report.page_reviews.is_empty() {
        0.0
    } else {
        report.page_reviews.iter().map(|r| r.score).sum::<f64>()
            / report.page_reviews.len() as f64
    };

    if (mean - report.overall_score).abs() > 0.01 {
        debug!(
            "Model overall score {:.2} replaced by page mean {:.2}",
            report.overall_score, mean
        );
    }

    report.overall_score = mean;
    report.passes_threshold = mean >= threshold;
    report
}
