use super::{CanvasMeta, CanvasStore, VersionId};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const SPEC_FILE: &str = "spec.md";
const CANVAS_DIR: &str = "canvas";
const META_FILE: &str = "canvas.json";
const PAGES_DIR: &str = "pages";

/// Filesystem layout rooted at `projects_root`:
/// `<project>/versions/<version>/{spec.md, canvas/canvas.json, canvas/pages/<slot>.html}`
pub struct FsStore {
    projects_root: PathBuf,
}

impl FsStore {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
        }
    }

    fn canvas_dir(&self, version: &VersionId) -> PathBuf {
        self.version_dir(version).join(CANVAS_DIR)
    }

    fn meta_path(&self, version: &VersionId) -> PathBuf {
        self.canvas_dir(version).join(META_FILE)
    }

    fn page_path(&self, version: &VersionId, slot_id: &str) -> PathBuf {
        self.canvas_dir(version)
            .join(PAGES_DIR)
            .join(format!("{}.html", slot_id))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

async fn write_creating_dirs(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_err(parent))?;
    }
    fs::write(path, content).await.map_err(io_err(path))
}

#[async_trait]
impl CanvasStore for FsStore {
    async fn read_spec(&self, version: &VersionId) -> Result<Option<String>, StoreError> {
        read_optional(&self.version_dir(version).join(SPEC_FILE)).await
    }

    async fn load_or_create_canvas(
        &self,
        version: &VersionId,
        name: &str,
    ) -> Result<CanvasMeta, StoreError> {
        if let Some(meta) = self.read_meta(version).await? {
            return Ok(meta);
        }

        let now = Utc::now();
        let meta = CanvasMeta {
            id: uuid::Uuid::new_v4().simple().to_string(),
            version_id: version.to_string(),
            name: name.to_string(),
            pages: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let pages_dir = self.canvas_dir(version).join(PAGES_DIR);
        fs::create_dir_all(&pages_dir)
            .await
            .map_err(io_err(&pages_dir))?;
        self.write_meta(version, &meta).await?;

        debug!("Created canvas {} for {}", meta.id, version);
        Ok(meta)
    }

    async fn read_meta(&self, version: &VersionId) -> Result<Option<CanvasMeta>, StoreError> {
        let path = self.meta_path(version);
        match read_optional(&path).await? {
            Some(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|source| StoreError::Json { path, source }),
            None => Ok(None),
        }
    }

    async fn write_meta(&self, version: &VersionId, meta: &CanvasMeta) -> Result<(), StoreError> {
        let path = self.meta_path(version);
        let json = serde_json::to_string_pretty(meta).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        write_creating_dirs(&path, &json).await
    }

    async fn read_page_html(
        &self,
        version: &VersionId,
        slot_id: &str,
    ) -> Result<String, StoreError> {
        Ok(read_optional(&self.page_path(version, slot_id))
            .await?
            .unwrap_or_default())
    }

    async fn write_page_html(
        &self,
        version: &VersionId,
        slot_id: &str,
        html: &str,
    ) -> Result<(), StoreError> {
        write_creating_dirs(&self.page_path(version, slot_id), html).await
    }

    async fn remove_page_html(
        &self,
        version: &VersionId,
        slot_id: &str,
    ) -> Result<(), StoreError> {
        let path = self.page_path(version, slot_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    fn version_dir(&self, version: &VersionId) -> PathBuf {
        self.projects_root
            .join(&version.project)
            .join("versions")
            .join(&version.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CanvasPageMeta;

    fn version() -> VersionId {
        "shop/v1".parse().unwrap()
    }

    #[tokio::test]
    async fn test_missing_spec_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert_eq!(store.read_spec(&version()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_spec_is_read_from_version_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let spec_dir = dir.path().join("shop/versions/v1");
        std::fs::create_dir_all(&spec_dir).unwrap();
        std::fs::write(spec_dir.join("spec.md"), "# Shop").unwrap();

        assert_eq!(
            store.read_spec(&version()).await.unwrap().as_deref(),
            Some("# Shop")
        );
    }

    #[tokio::test]
    async fn test_canvas_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let first = store.load_or_create_canvas(&version(), "Canvas").await.unwrap();
        let second = store.load_or_create_canvas(&version(), "Other").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Canvas");
        assert_eq!(second.version_id, "shop/v1");
        assert!(dir.path().join("shop/versions/v1/canvas/pages").is_dir());
    }

    #[tokio::test]
    async fn test_page_html_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert_eq!(store.read_page_html(&version(), "abc").await.unwrap(), "");
        store
            .write_page_html(&version(), "abc", "<html></html>")
            .await
            .unwrap();
        assert_eq!(
            store.read_page_html(&version(), "abc").await.unwrap(),
            "<html></html>"
        );

        store.remove_page_html(&version(), "abc").await.unwrap();
        store.remove_page_html(&version(), "abc").await.unwrap();
        assert!(!dir
            .path()
            .join("shop/versions/v1/canvas/pages/abc.html")
            .exists());
    }

    #[tokio::test]
    async fn test_meta_persists_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let mut meta = store.load_or_create_canvas(&version(), "Canvas").await.unwrap();
        meta.pages
            .push(CanvasPageMeta::new_slot("Home", "Landing", Utc::now()));
        store.write_meta(&version(), &meta).await.unwrap();

        let loaded = store.read_meta(&version()).await.unwrap().unwrap();
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].name, "Home");
    }

    #[tokio::test]
    async fn test_corrupt_meta_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let canvas = dir.path().join("shop/versions/v1/canvas");
        std::fs::create_dir_all(&canvas).unwrap();
        std::fs::write(canvas.join("canvas.json"), "{not json").unwrap();

        assert!(matches!(
            store.read_meta(&version()).await,
            Err(StoreError::Json { .. })
        ));
    }
}
