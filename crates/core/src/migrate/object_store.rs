use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Error type for object store operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// The source object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// IO error talking to the backing storage.
    #[error("Storage error: {0}")]
    Io(String),
}

/// Trait for the blob storage the migrator moves resources through.
///
/// Keys are forward-slash separated paths regardless of backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy the object at `from` to `to`, overwriting any existing object.
    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError>;

    /// Delete the object at `key`. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
}

/// Filesystem-backed object store rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty() && *s != "..") {
            path.push(segment);
        }
        path
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let src = self.resolve(from);
        if !src.exists() {
            return Err(ObjectStoreError::NotFound(from.to_string()));
        }
        let dst = self.resolve(to);
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
        }
        tokio::fs::copy(&src, &dst)
            .await
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.resolve(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ObjectStoreError::Io(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.resolve(key).exists())
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("root", &self.root)
            .finish()
    }
}
