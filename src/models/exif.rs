//! EXIF enrichment record.

use serde::{Deserialize, Serialize};

/// Technical capture metadata for one image. Every field is optional since
/// cameras and editing tools populate different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifFields {
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub focal_length: Option<String>,
    pub aperture: Option<String>,
    pub exposure: Option<String>,
    pub iso: Option<u32>,
    pub flash: Option<String>,
    pub date_taken: Option<String>,
}

impl ExifFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
