//! Photo model for the `line_photos` table.

use serde::{Deserialize, Serialize};

/// An uploaded photo belonging to a spot. Never updated once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    pub spot_id: i64,
    pub image_url: String,
    pub created_at: String,
}

/// A file that could not be stored during a batch upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub file_name: String,
    pub reason: String,
}

/// Result of a batch upload: the refreshed gallery plus per-file outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub photos: Vec<Photo>,
    pub uploaded: usize,
    pub failed: Vec<FailedUpload>,
}

/// A spot together with its gallery, as shown on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetail {
    pub spot: super::Spot,
    pub photos: Vec<Photo>,
}
