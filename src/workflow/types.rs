//! Stage payloads. Each derives `JsonSchema`: the schema is both shown to the
//! model and used to validate what comes back.

use crate::error::{DecodeError, InputError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hard ceiling on designed pages; config may only lower it
pub const MAX_DESIGN_PAGES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechDesign {
    pub pages: Vec<DesignPage>,
    pub components: Vec<DesignComponent>,
    pub design_tokens: DesignTokens,
    pub data_flow: String,
    pub navigation_type: NavigationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignPage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub layout: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignComponent {
    pub name: String,
    pub purpose: String,
    pub props: Vec<String>,
    pub placement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignTokens {
    pub primary_color: String,
    pub font_family: String,
    pub spacing: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
    Tabs,
    Sidebar,
    None,
}

impl TechDesign {
    /// Post-decode checks the schema cannot express
    pub fn check(&self, max_pages: usize) -> Result<(), DecodeError> {
        if self.pages.len() > max_pages {
            return Err(DecodeError::TooManyPages {
                count: self.pages.len(),
                max: max_pages,
            });
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id.as_str()) {
                return Err(DecodeError::DuplicatePageId(page.id.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationPlan {
    pub tasks: Vec<Task>,
    pub shared_components: Vec<String>,
    pub implementation_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub page_id: String,
    pub page_name: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub priority: u32,
}

impl ImplementationPlan {
    /// Tasks must map 1:1 onto design pages; generated output is routed back
    /// to storage slots by `page_id` alone.
    pub fn check_against(&self, design: &TechDesign) -> Result<(), InputError> {
        let known: HashSet<&str> = design.pages.iter().map(|p| p.id.as_str()).collect();
        let mut planned = HashSet::new();

        for task in &self.tasks {
            if !known.contains(task.page_id.as_str()) {
                return Err(InputError::UnknownPageId(task.page_id.clone()));
            }
            if !planned.insert(task.page_id.as_str()) {
                return Err(InputError::DuplicatePageId(task.page_id.clone()));
            }
        }

        if let Some(page) = design
            .pages
            .iter()
            .find(|p| !planned.contains(p.id.as_str()))
        {
            return Err(InputError::MissingPage(page.id.clone()));
        }

        Ok(())
    }
}

/// One coder attempt's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPage {
    pub page_id: String,
    pub page_name: String,
    pub html_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub overall_score: f64,
    pub page_reviews: Vec<PageReview>,
    pub passes_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageReview {
    pub page_id: String,
    #[schemars(range(min = 1, max = 10))]
    pub score: f64,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl QualityReport {
    /// Stand-in report when no page survived generation
    pub fn empty() -> Self {
        Self {
            overall_score: 0.0,
            page_reviews: Vec::new(),
            passes_threshold: false,
        }
    }

    /// Page ids scoring below `threshold`, in review order
    pub fn pages_below(&self, threshold: f64) -> Vec<String> {
        let mut seen = HashSet::new();
        self.page_reviews
            .iter()
            .filter(|r| r.score < threshold)
            .filter(|r| seen.insert(r.page_id.as_str()))
            .map(|r| r.page_id.clone())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn design(ids: &[&str]) -> TechDesign {
        TechDesign {
            pages: ids
                .iter()
                .map(|id| DesignPage {
                    id: id.to_string(),
                    name: format!("{} page", id),
                    description: format!("The {} screen", id),
                    layout: "single column".to_string(),
                })
                .collect(),
            components: vec![DesignComponent {
                name: "NavBar".to_string(),
                purpose: "Top navigation".to_string(),
                props: vec!["items".to_string()],
                placement: "top".to_string(),
            }],
            design_tokens: DesignTokens {
                primary_color: "#2563eb".to_string(),
                font_family: "Inter".to_string(),
                spacing: "4px grid".to_string(),
            },
            data_flow: "Pages share a cart held in localStorage".to_string(),
            navigation_type: NavigationType::Tabs,
        }
    }

    pub fn task(id: &str) -> Task {
        Task {
            page_id: id.to_string(),
            page_name: format!("{} page", id),
            description: format!("Build the {} screen", id),
            acceptance_criteria: vec!["Renders on mobile".to_string()],
            priority: 1,
        }
    }

    pub fn plan(ids: &[&str]) -> ImplementationPlan {
        ImplementationPlan {
            tasks: ids.iter().map(|id| task(id)).collect(),
            shared_components: vec!["NavBar".to_string()],
            implementation_order: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}
