/*!
 * Binary storage for uploaded source files.
 *
 * Keys are generated per upload and never reused. Deleting a key that does
 * not exist is an error the caller is expected to log, not to propagate.
 */

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::StorageError;

/// Storage collaborator for uploads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store `bytes` and return the generated key.
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Read a stored object back.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete a stored object.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Build a fresh storage key: a UUID followed by the sanitized file name.
pub fn generate_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}-{}", Uuid::new_v4(), sanitized)
}

/// Store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl DocumentStore for FileSystemStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let key = generate_key(file_name);
        let upload_error = |e: std::io::Error| StorageError::Upload {
            key: key.clone(),
            message: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(upload_error)?;
        tokio::fs::write(self.root.join(&key), bytes).await.map_err(upload_error)?;
        debug!("Stored {} bytes as {}", bytes.len(), key);
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|_| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted stored object {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
