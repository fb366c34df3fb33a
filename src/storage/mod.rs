//! Directory-backed blob buckets.
//!
//! Each bucket is a sub-directory of the storage root. Objects are written once
//! and exposed read-only under `/storage/{bucket}/{name}`.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// URL prefix under which stored objects are served.
pub const PUBLIC_PREFIX: &str = "/storage";

/// Blob storage rooted at a local directory.
pub struct BlobStore {
    root: PathBuf,
    public_url: String,
}

/// Reject names that could escape the bucket directory.
fn safe_segment(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    if trimmed.contains("..") || trimmed.contains('/') || trimmed.contains('\\') {
        return None;
    }
    Some(trimmed)
}

impl BlobStore {
    /// Create the storage root if needed.
    pub async fn open(root: &Path, public_url: &str) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` as `name` in `bucket`. Existing objects are never overwritten.
    pub async fn upload(&self, bucket: &str, name: &str, bytes: &[u8]) -> Result<(), AppError> {
        let bucket = safe_segment(bucket)
            .ok_or_else(|| AppError::Storage(format!("Invalid bucket name '{}'", bucket)))?;
        let name = safe_segment(name)
            .ok_or_else(|| AppError::Storage(format!("Invalid object name '{}'", name)))?;
        if bytes.is_empty() {
            return Err(AppError::Storage(format!(
                "Refusing to store empty object '{}'",
                name
            )));
        }

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    AppError::Storage(format!("Object '{}' already exists", name))
                }
                _ => AppError::from(e),
            })?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!("Stored {} bytes as {}/{}", bytes.len(), bucket, name);
        Ok(())
    }

    /// Public URL of an object. Does not check that the object exists.
    pub fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}{}/{}/{}", self.public_url, PUBLIC_PREFIX, bucket, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let temp = TempDir::new().unwrap();
        let store = BlobStore::open(temp.path(), "http://localhost:8080/")
            .await
            .unwrap();

        store
            .upload("spot-photos", "1-anchor.jpg", b"jpeg")
            .await
            .unwrap();

        let stored = std::fs::read(temp.path().join("spot-photos/1-anchor.jpg")).unwrap();
        assert_eq!(stored, b"jpeg");
        assert_eq!(
            store.public_url("spot-photos", "1-anchor.jpg"),
            "http://localhost:8080/storage/spot-photos/1-anchor.jpg"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let temp = TempDir::new().unwrap();
        let store = BlobStore::open(temp.path(), "http://localhost")
            .await
            .unwrap();

        assert!(store.upload("spot-photos", "empty.jpg", b"").await.is_err());
        assert!(store
            .upload("spot-photos", "../escape.jpg", b"x")
            .await
            .is_err());
        assert!(store.upload("..", "a.jpg", b"x").await.is_err());

        store.upload("spot-photos", "dup.jpg", b"x").await.unwrap();
        assert!(matches!(
            store.upload("spot-photos", "dup.jpg", b"y").await,
            Err(AppError::Storage(_))
        ));
    }
}
