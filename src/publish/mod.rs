//! Content Repository Interface
//!
//! The publishing backend is an external collaborator; the pipeline only
//! needs its contract. `save_document` persists a finished article as a
//! document; `store_media` persists raw image bytes and returns a hosted
//! URL, which the image side-load path depends on.
//!
//! `FsMediaStore` is the minimal filesystem-backed implementation the demo
//! binary runs with; real deployments plug in their CMS client here.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{AutopressError, GeneratedContent, Result};

/// Identifier of a persisted document.
pub type DocumentId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
}

/// Input shape the publishing backend accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub html_body: String,
    pub status: DocumentStatus,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub seo_description: Option<String>,
    pub image_url: Option<String>,
}

impl DocumentDraft {
    /// Draft built from a completed generation payload.
    pub fn from_content(content: &GeneratedContent, status: DocumentStatus) -> Self {
        Self {
            title: content.title.clone(),
            html_body: content.content_html.clone(),
            status,
            author: None,
            tags: content.tags.clone(),
            seo_description: (!content.seo_desc.is_empty()).then(|| content.seo_desc.clone()),
            image_url: content.image_preview_url.clone(),
        }
    }
}

/// External publishing backend.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Persist a document; returns its id or a structured failure.
    async fn save_document(&self, draft: DocumentDraft) -> Result<DocumentId>;

    /// Persist raw media bytes; returns the hosted URL.
    async fn store_media(&self, bytes: Vec<u8>, filename: &str) -> Result<String>;
}

/// Filesystem-backed media sink for local runs.
///
/// Stores media under a directory and returns `file://` URLs. Documents are
/// not persisted; local runs inspect the payload directly.
pub struct FsMediaStore {
    media_dir: PathBuf,
}

impl FsMediaStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }
}

#[async_trait]
impl ContentRepository for FsMediaStore {
    async fn save_document(&self, _draft: DocumentDraft) -> Result<DocumentId> {
        Err(AutopressError::Storage(
            "FsMediaStore does not persist documents; configure a publishing backend".to_string(),
        ))
    }

    async fn store_media(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.media_dir).await?;
        let path = self.media_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        info!("Stored media at {}", path.display());
        Ok(format!("file://{}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_from_content() {
        let content = GeneratedContent {
            title: "T".to_string(),
            content_html: "<p>b</p>".to_string(),
            seo_desc: String::new(),
            tags: vec!["a".to_string()],
            image_prompt: "p".to_string(),
            image_preview_url: Some("https://img.example/a.png".to_string()),
            image_preview_error: None,
        };
        let draft = DocumentDraft::from_content(&content, DocumentStatus::Draft);
        assert_eq!(draft.title, "T");
        assert_eq!(draft.status, DocumentStatus::Draft);
        assert!(draft.seo_description.is_none());
        assert_eq!(draft.image_url.as_deref(), Some("https://img.example/a.png"));
    }

    #[tokio::test]
    async fn test_fs_media_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let url = store
            .store_media(b"png-bytes".to_vec(), "img.png")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert_eq!(std::fs::read(dir.path().join("img.png")).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_fs_media_store_rejects_documents() {
        let store = FsMediaStore::new("/tmp/unused");
        let draft = DocumentDraft {
            title: "t".to_string(),
            html_body: "<p>b</p>".to_string(),
            status: DocumentStatus::Draft,
            author: None,
            tags: Vec::new(),
            seo_description: None,
            image_url: None,
        };
        assert!(store.save_document(draft).await.is_err());
    }
}
