//! LocalObjectStore -- [`ObjectStore`] backed by a directory tree.
//!
//! `s3://bucket/key` resolves to `<root>/bucket/key`. Used to replay captured
//! payloads without AWS access.

use std::path::{Component, Path, PathBuf};

use factsink_core::storage::object_store::ObjectStore;
use factsink_types::error::StorageError;
use factsink_types::notification::PayloadLocation;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a location to a path under the root, refusing anything that
    /// could escape it.
    fn resolve(&self, location: &PayloadLocation) -> Result<PathBuf, StorageError> {
        let relative = Path::new(&location.bucket).join(&location.key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::AccessDenied(format!(
                "{location} escapes the local root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, location: &PayloadLocation) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(location)?;
        tracing::debug!(path = %path.display(), "Reading local payload");

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageError::AccessDenied(path.display().to_string())
            }
            _ => StorageError::Io(format!("{}: {e}", path.display())),
        })
    }
}
