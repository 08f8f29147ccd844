use crate::error::OutputError;
use crate::workflow::RunSummary;
use std::fs;
use std::path::Path;

/// Write the final quality report of a run as Markdown
pub fn write_quality_report(path: &Path, summary: &RunSummary) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(OutputError::CreateDir)?;
    }
    fs::write(path, build_markdown(summary)).map_err(OutputError::WriteReport)
}

fn build_markdown(summary: &RunSummary) -> String {
    let report = &summary.report;
    let mut content = String::new();

    content.push_str("# Canvas Quality Report\n\n");

    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!("| Canvas | `{}` |\n", summary.canvas_id));
    content.push_str(&format!(
        "| Pages | {} of {} planned |\n",
        summary.page_count, summary.planned
    ));
    content.push_str(&format!("| Overall Score | {:.2} |\n", report.overall_score));
    content.push_str(&format!(
        "| Status | {} |\n",
        if report.passes_threshold {
            "✅ Passes"
        } else {
            "❌ Below threshold"
        }
    ));
    if !summary.retried.is_empty() {
        content.push_str(&format!("| Retried | {} |\n", summary.retried.join(", ")));
    }
    content.push('\n');

    if report.page_reviews.is_empty() {
        content.push_str("No pages were reviewed.\n");
        return content;
    }

    content.push_str("## Pages\n\n");
    for review in &report.page_reviews {
        let name = summary
            .pages
            .iter()
            .find(|p| p.page_id == review.page_id)
            .map(|p| p.page_name.as_str())
            .unwrap_or(review.page_id.as_str());
        content.push_str(&format!("### {} ({}/10)\n\n", name, review.score));

        if !review.issues.is_empty() {
            content.push_str("**Issues:**\n");
            for issue in &review.issues {
                content.push_str(&format!("- {}\n", issue));
            }
            content.push('\n');
        }

        if !review.suggestions.is_empty() {
            content.push_str("**Suggestions:**\n");
            for suggestion in &review.suggestions {
                content.push_str(&format!("- [ ] {}\n", suggestion));
            }
            content.push('\n');
        }

        content.push_str("---\n\n");
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{GeneratedPage, PageReview, QualityReport};
    use tempfile::TempDir;

    fn summary() -> RunSummary {
        RunSummary {
            canvas_id: "abc123".into(),
            page_count: 2,
            planned: 3,
            retried: vec!["cart".into()],
            report: QualityReport {
                overall_score: 7.5,
                passes_threshold: true,
                page_reviews: vec![
                    PageReview {
                        page_id: "home".into(),
                        score: 8.0,
                        issues: vec![],
                        suggestions: vec![],
                    },
                    PageReview {
                        page_id: "cart".into(),
                        score: 7.0,
                        issues: vec!["Low contrast on totals".into()],
                        suggestions: vec!["Use text-gray-900".into()],
                    },
                ],
            },
            pages: vec![
                GeneratedPage {
                    page_id: "home".into(),
                    page_name: "Home".into(),
                    html_content: String::new(),
                },
                GeneratedPage {
                    page_id: "cart".into(),
                    page_name: "Cart".into(),
                    html_content: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_markdown_sections() {
        let md = build_markdown(&summary());
        assert!(md.contains("| Pages | 2 of 3 planned |"));
        assert!(md.contains("| Overall Score | 7.50 |"));
        assert!(md.contains("| Retried | cart |"));
        assert!(md.contains("### Cart (7/10)"));
        assert!(md.contains("- Low contrast on totals"));
        assert!(md.contains("- [ ] Use text-gray-900"));
    }

    #[test]
    fn test_empty_report() {
        let mut s = summary();
        s.report = QualityReport::empty();
        s.retried.clear();
        let md = build_markdown(&s);
        assert!(md.contains("No pages were reviewed."));
        assert!(!md.contains("Retried"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports/run.md");
        write_quality_report(&path, &summary()).unwrap();
        assert!(fs::read_to_string(path).unwrap().starts_with("# Canvas Quality Report"));
    }
}
