//! Storage Abstraction
//!
//! Provides a unified interface for the backends uploaded images and
//! assets are written to.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use rc_core::config::StorageConfig;
use rc_core::error::RcError;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl From<StorageError> for RcError {
    fn from(err: StorageError) -> Self {
        RcError::Storage(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// File metadata from storage
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Content type (MIME)
    pub content_type: String,
    /// SHA256 digest
    pub digest: String,
    /// Last modified time
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl FileMetadata {
    fn for_content(key: &str, data: &[u8]) -> Self {
        Self {
            size: data.len() as u64,
            content_type: guess_content_type(key),
            digest: calculate_digest(data),
            last_modified: Some(chrono::Utc::now()),
        }
    }
}

/// Storage trait - unified interface for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store data with a key
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<FileMetadata>;

    /// Retrieve data by key
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete data by key; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get file metadata
    async fn metadata(&self, key: &str) -> StorageResult<FileMetadata>;

    /// Get storage name for logging
    fn name(&self) -> &str;
}

/// Calculate SHA256 digest
fn calculate_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Guess content type from filename
fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key).first_or_octet_stream().to_string()
}

/// Local filesystem storage
pub struct LocalStorage {
    /// Root directory for storage
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.local_path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a full path
    fn resolve_path(&self, key: &str) -> StorageResult<PathBuf> {
        // Prevent directory traversal
        let escapes = Path::new(key).components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if key.is_empty() || escapes || key.contains('\0') || key.starts_with('\\') {
            return Err(StorageError::InvalidPath(key.to_string()));
        }

        Ok(self.root.join(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    #[instrument(skip(self, data), fields(storage = "local"))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<FileMetadata> {
        let path = self.resolve_path(key)?;
        self.ensure_parent(&path).await?;

        let metadata = FileMetadata::for_content(key, &data);

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        debug!(path = ?path, size = metadata.size, "File stored");

        Ok(metadata)
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.resolve_path(key)?;

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let mut file = fs::File::open(&path).await?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).await?;

        Ok(Bytes::from(buffer))
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve_path(key)?;

        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
            debug!(path = ?path, "File deleted");
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.resolve_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn metadata(&self, key: &str) -> StorageResult<FileMetadata> {
        let data = self.get(key).await?;
        let path = self.resolve_path(key)?;
        let meta = fs::metadata(&path).await?;

        Ok(FileMetadata {
            size: meta.len(),
            content_type: guess_content_type(key),
            digest: calculate_digest(&data),
            last_modified: meta.modified().ok().map(chrono::DateTime::from),
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// In-memory storage for testing
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<String, (Bytes, FileMetadata)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<FileMetadata> {
        let metadata = FileMetadata::for_content(key, &data);

        let mut files = self.files.write().await;
        files.insert(key.to_string(), (data, metadata.clone()));

        Ok(metadata)
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let files = self.files.read().await;
        files
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut files = self.files.write().await;
        files.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let files = self.files.read().await;
        Ok(files.contains_key(key))
    }

    async fn metadata(&self, key: &str) -> StorageResult<FileMetadata> {
        let files = self.files.read().await;
        files
            .get(key)
            .map(|(_, meta)| meta.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// A file written to storage during an import
///
/// Handles are collected while an import runs so that everything written
/// can be removed again if the import does not commit.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub key: String,
    pub metadata: FileMetadata,
}

/// Delete previously stored files, returning how many could not be removed
pub async fn delete_stored_files(storage: &dyn Storage, files: &[StoredFile]) -> usize {
    let mut failed = 0;
    for file in files {
        if let Err(e) = storage.delete(&file.key).await {
            error!(key = %file.key, storage = storage.name(), error = %e, "Failed to delete stored file");
            failed += 1;
        }
    }
    failed
}

/// Generate a unique storage key below `prefix`
pub fn generate_key(prefix: &str, filename: &str) -> String {
    let uuid = Uuid::new_v4();
    let date = chrono::Utc::now().format("%Y/%m/%d");
    format!("{}/{}/{}/{}", prefix, date, uuid, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_put_get() {
        let storage = MemoryStorage::new();
        let data = Bytes::from("Hello, World!");

        let meta = storage.put("test.txt", data.clone()).await.unwrap();
        assert_eq!(meta.size, 13);
        assert_eq!(meta.content_type, "text/plain");

        let retrieved = storage.get("test.txt").await.unwrap();
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_memory_storage_delete() {
        let storage = MemoryStorage::new();
        storage.put("test.txt", Bytes::from("test data")).await.unwrap();
        assert!(storage.exists("test.txt").await.unwrap());

        storage.delete("test.txt").await.unwrap();
        assert!(!storage.exists("test.txt").await.unwrap());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_storage_not_found() {
        let storage = MemoryStorage::new();

        let result = storage.get("nonexistent.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_stored_files() {
        let storage = MemoryStorage::new();
        let meta = storage.put("a.png", Bytes::from_static(b"a")).await.unwrap();
        storage.put("b.png", Bytes::from_static(b"b")).await.unwrap();

        let handles = vec![StoredFile { key: "a.png".into(), metadata: meta }];
        assert_eq!(delete_stored_files(&storage, &handles).await, 0);
        assert!(!storage.exists("a.png").await.unwrap());
        assert!(storage.exists("b.png").await.unwrap());
    }

    #[test]
    fn test_generate_key() {
        let key = generate_key("uploadedimages", "screenshot.png");
        assert!(key.starts_with("uploadedimages/"));
        assert!(key.ends_with("/screenshot.png"));
        assert_ne!(key, generate_key("uploadedimages", "screenshot.png"));
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = generate_key("uploadedassets", "logo.svg");

        let meta = storage.put(&key, Bytes::from_static(b"<svg/>")).await.unwrap();
        assert_eq!(meta.content_type, "image/svg+xml");
        assert_eq!(storage.get(&key).await.unwrap(), Bytes::from_static(b"<svg/>"));
        assert_eq!(storage.metadata(&key).await.unwrap().digest, meta.digest);

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
        let result = storage.put("/etc/passwd", Bytes::new()).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_local_storage_dotted_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for name in ["report..final.png", "..hidden"] {
            let key = generate_key("uploadedimages", name);
            storage.put(&key, Bytes::from_static(b"png")).await.unwrap();
            assert_eq!(storage.get(&key).await.unwrap(), Bytes::from_static(b"png"));
        }

        let result = storage.put("uploadedimages/../escape.png", Bytes::new()).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }
}
