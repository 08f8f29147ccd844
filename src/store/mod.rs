//! Canvas storage: spec text, `canvas.json` metadata and page HTML files.
//!
//! The pipeline only sees the [`CanvasStore`] trait. Nothing here locks the
//! metadata document, so two concurrent runs on one canvas can still race.

mod fs;
mod types;

pub use fs::FsStore;
pub use types::{CanvasMeta, CanvasPageMeta, VersionId};

use crate::error::StoreError;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait CanvasStore: Send + Sync {
    /// Spec text for a version, `None` when the file does not exist
    async fn read_spec(&self, version: &VersionId) -> Result<Option<String>, StoreError>;

    /// Existing canvas metadata, or a freshly written empty canvas
    async fn load_or_create_canvas(
        &self,
        version: &VersionId,
        name: &str,
    ) -> Result<CanvasMeta, StoreError>;

    async fn read_meta(&self, version: &VersionId) -> Result<Option<CanvasMeta>, StoreError>;

    async fn write_meta(&self, version: &VersionId, meta: &CanvasMeta) -> Result<(), StoreError>;

    /// Page HTML, empty when the slot has never been filled
    async fn read_page_html(&self, version: &VersionId, slot_id: &str)
        -> Result<String, StoreError>;

    async fn write_page_html(
        &self,
        version: &VersionId,
        slot_id: &str,
        html: &str,
    ) -> Result<(), StoreError>;

    /// Removing a missing page is not an error
    async fn remove_page_html(&self, version: &VersionId, slot_id: &str)
        -> Result<(), StoreError>;

    /// Directory that version control operates on
    fn version_dir(&self, version: &VersionId) -> PathBuf;
}
