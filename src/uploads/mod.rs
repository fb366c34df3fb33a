//! Sequential photo upload queue.
//!
//! Files are processed strictly one at a time in submission order. A failing file
//! is logged and skipped; the rest of the batch still runs. Nothing is rolled back
//! or retried.

use std::collections::VecDeque;

use chrono::Utc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{FailedUpload, Photo};
use crate::storage::BlobStore;

/// A file received from the client, waiting to be stored.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outcome of draining a queue.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub stored: Vec<Photo>,
    pub failed: Vec<FailedUpload>,
}

/// FIFO of files destined for one spot's gallery.
#[derive(Debug, Default)]
pub struct UploadQueue {
    items: VecDeque<PendingUpload>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, upload: PendingUpload) {
        self.items.push_back(upload);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store every queued file and record a photo row for each success.
    pub async fn process(
        mut self,
        spot_id: i64,
        repo: &Repository,
        blobs: &BlobStore,
        bucket: &str,
    ) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();

        while let Some(upload) = self.items.pop_front() {
            match upload_one(spot_id, &upload, repo, blobs, bucket).await {
                Ok(photo) => {
                    tracing::info!(spot_id, photo_id = photo.id, "Uploaded {}", upload.file_name);
                    outcome.stored.push(photo);
                }
                Err(e) => {
                    tracing::warn!(spot_id, "Skipping {}: {}", upload.file_name, e);
                    outcome.failed.push(FailedUpload {
                        file_name: upload.file_name,
                        reason: e.message().to_string(),
                    });
                }
            }
        }

        outcome
    }
}

async fn upload_one(
    spot_id: i64,
    upload: &PendingUpload,
    repo: &Repository,
    blobs: &BlobStore,
    bucket: &str,
) -> Result<Photo, AppError> {
    let name = object_name(&upload.file_name);
    blobs.upload(bucket, &name, &upload.bytes).await?;
    let url = blobs.public_url(bucket, &name);
    repo.insert_photo(spot_id, &url).await
}

/// Collision-resistant object name: `{unix_millis}-{8 hex chars}-{sanitized name}`.
pub fn object_name(original: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &suffix[..8],
        sanitize_file_name(original)
    )
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `-`.
/// Runs of dots collapse to one.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            c
        } else {
            '-'
        };
        if c == '.' && cleaned.ends_with('.') {
            continue;
        }
        cleaned.push(c);
    }
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::map::LatLng;
    use crate::models::{LineType, NewSpot};
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("IMG 0042.JPG"), "IMG-0042.JPG");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\rig.png"), "rig.png");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name("a..b.jpg"), "a.b.jpg");
        assert_eq!(sanitize_file_name("a...b.jpg"), "a.b.jpg");
        assert_eq!(sanitize_file_name("summit....jpg"), "summit.jpg");
    }

    #[test]
    fn test_object_names_are_unique() {
        let a = object_name("line.jpg");
        let b = object_name("line.jpg");
        assert_ne!(a, b);
        assert!(a.ends_with("-line.jpg"));
        assert!(a.split('-').next().unwrap().parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_failed_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let pool = init_database(&temp.path().join("test.sqlite")).await.unwrap();
        let repo = Repository::new(pool);
        let blobs = BlobStore::open(&temp.path().join("storage"), "http://localhost")
            .await
            .unwrap();
        let spot = repo
            .insert_spot(&NewSpot {
                name: "Queue".to_string(),
                line_type: LineType::Highline,
                start: LatLng::new(1.0, 1.0),
                end: None,
                length: None,
                anchor_type: None,
                tag: None,
                established_by: None,
                first_ascent: None,
                description: None,
                approach: None,
                location_data: None,
            })
            .await
            .unwrap();

        let mut queue = UploadQueue::new();
        for (name, bytes) in [("one.jpg", &b"1"[..]), ("two.jpg", &b""[..]), ("three.jpg", &b"3"[..])] {
            queue.push(PendingUpload {
                file_name: name.to_string(),
                bytes: bytes.to_vec(),
            });
        }
        assert_eq!(queue.len(), 3);

        let outcome = queue.process(spot.id, &repo, &blobs, "spot-photos").await;

        assert_eq!(outcome.stored.len(), 2);
        assert!(outcome.stored[0].image_url.ends_with("-one.jpg"));
        assert!(outcome.stored[1].image_url.ends_with("-three.jpg"));
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].file_name, "two.jpg");
        assert_eq!(repo.list_photos(spot.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dotted_file_name_uploads() {
        let temp = TempDir::new().unwrap();
        let blobs = BlobStore::open(&temp.path().join("storage"), "http://localhost")
            .await
            .unwrap();

        let name = object_name("summit...jpg");
        assert!(name.ends_with("-summit.jpg"));
        blobs.upload("spot-photos", &name, b"view").await.unwrap();

        let stored = tokio::fs::read(temp.path().join("storage/spot-photos").join(&name))
            .await
            .unwrap();
        assert_eq!(stored, b"view");
    }
}
