//! Normalization of raw upstream shapes into domain records.
//!
//! Upstream fields are optional and inconsistently present, so the raw
//! shapes default every field and the domain records are assembled with
//! explicit fallbacks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{GalleryError, Result};
use crate::models::{Album, ExifFields, Image};
use crate::repository::keys;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct UriRef {
    #[serde(deserialize_with = "null_as_default")]
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawAlbum {
    #[serde(deserialize_with = "null_as_default")]
    album_key: String,
    title: Option<String>,
    name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    description: String,
    #[serde(deserialize_with = "null_as_default")]
    keywords: String,
    #[serde(deserialize_with = "null_as_default")]
    keyword_array: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    image_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    uris: HashMap<String, UriRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawImage {
    #[serde(deserialize_with = "null_as_default")]
    image_key: String,
    #[serde(deserialize_with = "null_as_default")]
    title: String,
    #[serde(deserialize_with = "null_as_default")]
    caption: String,
    #[serde(deserialize_with = "null_as_default")]
    keywords: String,
    #[serde(deserialize_with = "null_as_default")]
    keyword_array: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    file_name: String,
    #[serde(deserialize_with = "null_as_default")]
    format: String,
    #[serde(deserialize_with = "null_as_default")]
    original_width: u32,
    #[serde(deserialize_with = "null_as_default")]
    original_height: u32,
    #[serde(deserialize_with = "null_as_default")]
    archived_uri: String,
    thumbnail_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    upload_key: String,
    date_time_original: Option<String>,
    date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    uris: HashMap<String, UriRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    #[serde(rename = "Camera", alias = "Model")]
    camera: Option<Value>,
    #[serde(rename = "Lens", alias = "LensModel")]
    lens: Option<Value>,
    #[serde(rename = "FocalLength")]
    focal_length: Option<Value>,
    #[serde(rename = "Aperture", alias = "FNumber")]
    aperture: Option<Value>,
    #[serde(rename = "Exposure", alias = "ExposureTime")]
    exposure: Option<Value>,
    #[serde(rename = "ISO", alias = "ISOSpeed")]
    iso: Option<Value>,
    #[serde(rename = "Flash")]
    flash: Option<Value>,
    #[serde(rename = "DateTimeOriginal", alias = "DateTimeCreated")]
    date_taken: Option<Value>,
}

/// The current-user payload, reduced to the album collection link.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthUser {
    #[serde(deserialize_with = "null_as_default")]
    user: RawUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RawUser {
    #[serde(deserialize_with = "null_as_default")]
    uris: HashMap<String, UriRef>,
}

impl AuthUser {
    pub fn albums_uri(&self) -> Result<&str> {
        self.user
            .uris
            .get("UserAlbums")
            .map(|u| u.uri.as_str())
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| {
                GalleryError::MalformedPayload("current user has no UserAlbums URI".into())
            })
    }
}

/// Best-effort URL resolution happened for an image.
///
/// Reported and logged, never raised: the image is still returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedDataWarning {
    pub image_key: String,
    pub reason: &'static str,
}

pub fn parse_album(raw: Value) -> Result<Album> {
    let raw: RawAlbum = serde_json::from_value(raw)
        .map_err(|e| GalleryError::MalformedPayload(format!("album: {e}")))?;
    if raw.album_key.is_empty() {
        return Err(GalleryError::MalformedPayload("album without AlbumKey".into()));
    }

    let images_endpoint = raw
        .uris
        .get("AlbumImages")
        .map(|u| u.uri.clone())
        .filter(|uri| !uri.is_empty())
        .unwrap_or_else(|| keys::album_images_endpoint(&raw.album_key));

    Ok(Album {
        title: non_empty(raw.title)
            .or_else(|| non_empty(raw.name))
            .unwrap_or_else(|| raw.album_key.clone()),
        key: raw.album_key,
        description: raw.description,
        keywords: keywords(raw.keyword_array, &raw.keywords),
        images_endpoint,
        total_image_count: raw.image_count,
        images: None,
    })
}

pub fn parse_albums(raw: Vec<Value>) -> Result<Vec<Album>> {
    raw.into_iter().map(parse_album).collect()
}

/// Builds an [`Image`], resolving its URLs through the fallback chain:
/// the expanded largest image, then per-size details (large and x-large
/// before original), then the archived URI.
pub fn parse_image(
    raw: Value,
    expansions: &Map<String, Value>,
) -> Result<(Image, Option<DegradedDataWarning>)> {
    let raw: RawImage = serde_json::from_value(raw)
        .map_err(|e| GalleryError::MalformedPayload(format!("image: {e}")))?;

    let largest = expansion(&raw.uris, expansions, "LargestImage").and_then(url_of);
    let sizes = expansion(&raw.uris, expansions, "ImageSizeDetails");
    let size = |name: &str| sizes.and_then(|s| s.get(name)).and_then(url_of);

    let archived = raw.archived_uri.clone();
    let large_image_url = largest
        .clone()
        .or_else(|| size("ImageSizeLarge"))
        .or_else(|| size("ImageSizeXLarge"))
        .or_else(|| size("ImageSizeOriginal"))
        .unwrap_or_else(|| archived.clone());
    let original_image_url = size("ImageSizeOriginal")
        .or_else(|| largest.clone())
        .unwrap_or_else(|| archived.clone());
    let thumbnail_url = non_empty(raw.thumbnail_url)
        .or_else(|| size("ImageSizeThumb"))
        .unwrap_or_else(|| archived.clone());

    let warning = largest.is_none().then(|| DegradedDataWarning {
        image_key: raw.image_key.clone(),
        reason: if sizes.is_some() {
            "largest-image expansion missing, used size details"
        } else {
            "no expansions present, used archived URI"
        },
    });

    let date = raw
        .date_time_original
        .as_deref()
        .or(raw.date.as_deref())
        .and_then(parse_date);

    let image = Image {
        key: raw.image_key,
        title: raw.title,
        caption: raw.caption,
        keywords: keywords(raw.keyword_array, &raw.keywords),
        file_name: raw.file_name,
        format: raw.format,
        width: raw.original_width,
        height: raw.original_height,
        archived_uri: raw.archived_uri,
        thumbnail_url,
        large_image_url,
        original_image_url,
        upload_key: raw.upload_key,
        date,
    };
    Ok((image, warning))
}

pub fn parse_exif(raw: Value) -> Result<ExifFields> {
    let raw: RawMetadata = serde_json::from_value(raw)
        .map_err(|e| GalleryError::MalformedPayload(format!("image metadata: {e}")))?;

    Ok(ExifFields {
        camera: text(raw.camera),
        lens: text(raw.lens),
        focal_length: text(raw.focal_length),
        aperture: text(raw.aperture),
        exposure: text(raw.exposure),
        iso: text(raw.iso).and_then(|iso| iso.trim().parse().ok()),
        flash: text(raw.flash),
        date_taken: text(raw.date_taken),
    })
}

/// Upstream sends explicit `null` for unset fields; treat it like an absent one.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Looks up the expanded object for `Uris.<name>` in the expansion map.
fn expansion<'a>(
    uris: &HashMap<String, UriRef>,
    expansions: &'a Map<String, Value>,
    name: &str,
) -> Option<&'a Value> {
    let uri = &uris.get(name)?.uri;
    expansions.get(uri)?.get(name)
}

fn url_of(value: &Value) -> Option<String> {
    value
        .get("Url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn keywords(array: Vec<String>, joined: &str) -> Vec<String> {
    let source: Vec<String> = if array.is_empty() {
        joined.split([';', ',']).map(str::to_string).collect()
    } else {
        array
    };
    source
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
