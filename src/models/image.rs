//! Image domain record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One image of an album, with resolved display URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub key: String,
    pub title: String,
    pub caption: String,
    pub keywords: Vec<String>,
    pub file_name: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Permanent download URI; the last resort for every URL field
    pub archived_uri: String,
    pub thumbnail_url: String,
    pub large_image_url: String,
    pub original_image_url: String,
    pub upload_key: String,
    pub date: Option<DateTime<Utc>>,
}

impl Image {
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0).then(|| f64::from(self.width) / f64::from(self.height))
    }
}
