use crate::error::InputError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `projectId/versionFolder`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionId {
    pub project: String,
    pub version: String,
}

impl FromStr for VersionId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InputError::InvalidVersionId(s.to_string());
        let (project, version) = s.split_once('/').ok_or_else(invalid)?;

        let segment_ok = |seg: &str| {
            !seg.is_empty() && seg != "." && seg != ".." && !seg.contains(['/', '\\'])
        };
        if !segment_ok(project) || !segment_ok(version) {
            return Err(invalid());
        }

        Ok(Self {
            project: project.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.version)
    }
}

/// Canvas metadata stored in `canvas.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasMeta {
    pub id: String,
    pub version_id: String,
    pub name: String,
    #[serde(default)]
    pub pages: Vec<CanvasPageMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One pre-allocated page slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasPageMeta {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Relative to the canvas directory: `pages/{id}.html`
    pub html_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CanvasPageMeta {
    pub fn new_slot(name: &str, description: &str, now: DateTime<Utc>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            html_path: format!("pages/{}.html", id),
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}
