use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::error::AppError;
use crate::session::DocumentId;
use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Prefix under which uploaded documents are written.
const DOCUMENT_PREFIX: &str = "documents";

/// Document store over an object-store backend.
///
/// Uploads are written to a location derived from the original file name, so
/// the location doubles as the document's stable identity. Writing the same
/// name again overwrites the previous object; deduplication is not this
/// layer's concern.
#[derive(Clone)]
pub struct DocumentStore {
    store: DynStore,
    backend_kind: StorageKind,
    local_base: Option<PathBuf>,
}

impl DocumentStore {
    /// Create a new DocumentStore from the application configuration.
    ///
    /// For the local backend the document root is created if it does not
    /// exist yet.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let (store, local_base) = create_storage_backend(cfg).await?;

        Ok(Self {
            store,
            backend_kind,
            local_base,
        })
    }

    /// Create a DocumentStore with a custom backend, bypassing configuration.
    ///
    /// Useful for tests that want to inject a specific backend.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
            local_base: None,
        }
    }

    /// Get the storage backend kind.
    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Access the resolved local base directory when using the local backend.
    pub fn local_base_path(&self) -> Option<&Path> {
        self.local_base.as_deref()
    }

    /// Resolve an object location to a filesystem path when using the local backend.
    ///
    /// Returns `None` when the backend is not local or when the provided location
    /// includes unsupported components (absolute paths or parent traversals).
    pub fn resolve_local_path(&self, location: &str) -> Option<PathBuf> {
        let base = self.local_base_path()?;
        let relative = Path::new(location);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }

        Some(base.join(relative))
    }

    /// Persist an uploaded document and return its identity.
    ///
    /// The location is derived from the sanitized file name, so the same name
    /// always lands at the same location and an existing object there is
    /// overwritten (last write wins). A blank file name is rejected before
    /// anything is written.
    pub async fn persist(&self, file_name: &str, data: Bytes) -> Result<DocumentId, AppError> {
        if file_name.trim().is_empty() {
            return Err(AppError::Validation("file name missing".to_string()));
        }

        let location = format!("{DOCUMENT_PREFIX}/{}", sanitize_file_name(file_name));
        let path = ObjPath::from(location.as_str());
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await?;

        Ok(DocumentId::new(location))
    }

    /// Retrieve a stored document, fully buffered.
    pub async fn fetch(&self, id: &DocumentId) -> object_store::Result<Bytes> {
        let path = ObjPath::from(id.as_str());
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Check whether a document exists at the given identity.
    pub async fn exists(&self, id: &DocumentId) -> object_store::Result<bool> {
        let path = ObjPath::from(id.as_str());
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }

    /// List the identities of all stored documents.
    pub async fn list_documents(&self) -> object_store::Result<Vec<DocumentId>> {
        let prefix = ObjPath::from(DOCUMENT_PREFIX);
        let metas: Vec<object_store::ObjectMeta> =
            self.store.list(Some(&prefix)).try_collect().await?;
        Ok(metas
            .into_iter()
            .map(|meta| DocumentId::new(meta.location.as_ref()))
            .collect())
    }
}

/// Replace everything but alphanumerics and underscores in a file name,
/// keeping the extension separator intact.
///
/// The mapping is total and deterministic; equal inputs always produce equal
/// locations.
pub fn sanitize_file_name(file_name: &str) -> String {
    fn clean(part: &str) -> String {
        part.chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }

    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            format!("{}.{}", clean(stem), clean(extension))
        }
        _ => clean(file_name),
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(
    cfg: &AppConfig,
) -> object_store::Result<(DynStore, Option<PathBuf>)> {
    match cfg.storage {
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base.clone())?;
            Ok((Arc::new(store), Some(base)))
        }
        StorageKind::Memory => {
            let store = InMemory::new();
            Ok((Arc::new(store), None))
        }
    }
}

/// Resolve the absolute base directory used for local storage from config.
///
/// If `data_dir` is relative, it is resolved against the current working directory.
pub fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    if cfg.data_dir.starts_with('/') {
        PathBuf::from(&cfg.data_dir)
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cfg.data_dir)
    }
}

/// Test utilities for storage-backed code.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    /// Ready-to-use configuration with the memory backend.
    pub fn test_config() -> AppConfig {
        AppConfig {
            openai_api_key: "test".into(),
            ingest_service_url: "http://localhost:0/ingest".into(),
            lookup_service_url: "http://localhost:0/lookup".into(),
            data_dir: "/tmp/unused".into(), // Ignored for memory storage
            http_port: 0,
            openai_base_url: "http://localhost:0/v1".into(),
            query_model: "test-model".into(),
            ingest_max_body_bytes: 50 * 1024 * 1024,
            storage: StorageKind::Memory,
        }
    }

    /// In-memory DocumentStore for unit tests; fast and fully isolated.
    pub fn memory_store() -> DocumentStore {
        DocumentStore::with_backend(Arc::new(InMemory::new()), StorageKind::Memory)
    }
}
