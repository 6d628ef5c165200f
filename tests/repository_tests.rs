//! Integration Tests for the Album Repository
//!
//! Full stack against the mock upstream: signed transport, pagination,
//! normalization, caching and coalescing.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{credentials, fast_retry, MockReply, MockUpstream, RecordedRequest};
use gallery_mirror::cache::SharedCache;
use gallery_mirror::config::CacheSettings;
use gallery_mirror::repository::{AlbumRepository, RepositorySettings};
use gallery_mirror::transport::SignedTransport;
use gallery_mirror::GalleryError;
use serde_json::{json, Value};

const ALBUMS_PATH: &str = "/api/v2/user/gallery-owner!albums";
const PAGE_SIZES: [usize; 3] = [100, 100, 37];

// == Mock API ==

fn page_of_albums(request: &RecordedRequest) -> MockReply {
    let start: usize = request.query["start"].parse().unwrap();
    let count: usize = request.query["count"].parse().unwrap();
    let index = (start - 1) / count;
    let size = PAGE_SIZES.get(index).copied().unwrap_or(0);

    let albums: Vec<Value> = (0..size)
        .map(|i| {
            let n = start + i;
            json!({ "AlbumKey": format!("A{n}"), "Name": format!("Album {n}"), "ImageCount": 1 })
        })
        .collect();
    let next_page = (index + 1 < PAGE_SIZES.len())
        .then(|| format!("{ALBUMS_PATH}?start={}&count={count}", start + count));

    MockReply::ok(json!({
        "Album": albums,
        "Pages": { "Total": 237, "Start": start, "Count": size, "RequestedCount": count, "NextPage": next_page }
    }))
}

fn album_images() -> MockReply {
    MockReply::ok(json!({
        "AlbumImage": [
            {
                "ImageKey": "full-0",
                "Title": "Expanded",
                "ArchivedUri": "https://photos.example.com/full.jpg",
                "ThumbnailUrl": "https://photos.example.com/full-Th.jpg",
                "Uris": {
                    "LargestImage": { "Uri": "/api/v2/image/full-0!largestimage" },
                    "ImageSizeDetails": { "Uri": "/api/v2/image/full-0!sizedetails" }
                }
            },
            {
                "ImageKey": "bare-0",
                "Title": "Bare",
                "ArchivedUri": "https://photos.example.com/bare.jpg"
            }
        ],
        "Expansions": {
            "/api/v2/image/full-0!largestimage": {
                "LargestImage": { "Url": "https://photos.example.com/full-X3.jpg" }
            },
            "/api/v2/image/full-0!sizedetails": {
                "ImageSizeDetails": {
                    "ImageSizeOriginal": { "Url": "https://photos.example.com/full-O.jpg" }
                }
            }
        }
    }))
}

fn gallery_api(request: &RecordedRequest, _seen: usize) -> MockReply {
    match request.path.as_str() {
        "/api/v2!authuser" => MockReply::ok(json!({
            "User": { "NickName": "gallery-owner", "Uris": { "UserAlbums": { "Uri": ALBUMS_PATH } } }
        })),
        ALBUMS_PATH => page_of_albums(request),
        "/api/v2/album/A1!images" => album_images().after(Duration::from_millis(100)),
        "/api/v2/image/full-0!metadata" => MockReply::ok(json!({
            "ImageMetadata": { "Model": "X-T5", "LensModel": "XF23mmF2", "FNumber": "f/2.0", "ISO": 160 }
        })),
        _ => MockReply::raw(StatusCode::NOT_FOUND, r#"{"Code":404,"Message":"Not Found"}"#),
    }
}

fn repository(upstream: &MockUpstream) -> AlbumRepository {
    let transport = SignedTransport::new(&upstream.base_url, credentials(), fast_retry()).unwrap();
    AlbumRepository::new(
        Arc::new(transport),
        SharedCache::new(100),
        RepositorySettings::new("gallery-owner", &CacheSettings::default()),
    )
}

// == Pagination ==

#[tokio::test]
async fn test_list_albums_walks_all_pages() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let albums = repo.list_albums().await.unwrap();

    assert_eq!(albums.len(), 237);
    assert_eq!(albums[0].key, "A1");
    assert_eq!(albums[236].key, "A237");
    assert_eq!(albums[0].title, "Album 1");
    assert_eq!(upstream.count(ALBUMS_PATH), 3);

    let starts: Vec<String> = upstream
        .requests()
        .iter()
        .filter(|r| r.path == ALBUMS_PATH)
        .map(|r| r.query["start"].clone())
        .collect();
    assert_eq!(starts, vec!["1", "101", "201"]);
}

#[tokio::test]
async fn test_gallery_load_is_lazy_and_cached() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let gallery = repo.load_gallery().await.unwrap();
    let again = repo.load_gallery().await.unwrap();

    assert_eq!(gallery.albums.len(), 237);
    assert_eq!(gallery.total_image_count, 237);
    assert!(gallery.albums.iter().all(|a| a.images.is_none()));
    assert_eq!(again.albums, gallery.albums);
    assert!(upstream.requests().iter().all(|r| !r.path.ends_with("!images")));
    assert_eq!(upstream.count("/api/v2!authuser"), 1);
    assert_eq!(upstream.count(ALBUMS_PATH), 3);
}

// == Album Images ==

#[tokio::test]
async fn test_album_images_resolve_urls() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let images = repo.list_album_images("A1").await.unwrap();

    assert_eq!(images.len(), 2);
    let full = &images[0];
    assert_eq!(full.large_image_url, "https://photos.example.com/full-X3.jpg");
    assert_eq!(full.original_image_url, "https://photos.example.com/full-O.jpg");
    assert_eq!(full.thumbnail_url, "https://photos.example.com/full-Th.jpg");

    let bare = &images[1];
    assert_eq!(bare.large_image_url, "https://photos.example.com/bare.jpg");
    assert_eq!(bare.original_image_url, "https://photos.example.com/bare.jpg");
    assert_eq!(bare.thumbnail_url, "https://photos.example.com/bare.jpg");

    let request = upstream
        .requests()
        .into_iter()
        .find(|r| r.path == "/api/v2/album/A1!images")
        .unwrap();
    assert_eq!(request.query["_expand"], "LargestImage,ImageSizeDetails");
    assert_eq!(request.query["start"], "1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_album_opens_share_one_request() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.list_album_images("A1").await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 2);
    }

    assert_eq!(upstream.count("/api/v2/album/A1!images"), 1);
    assert!(repo.cache_stats().keys.contains(&"images:A1".to_string()));
}

#[tokio::test]
async fn test_unknown_album_surfaces_upstream_error() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let err = repo.list_album_images("Nope").await.unwrap_err();

    assert!(matches!(err, GalleryError::Upstream { status: 404, .. }));
    assert_eq!(upstream.count("/api/v2/album/Nope!images"), 1);

    // Failures are not cached.
    repo.list_album_images("Nope").await.unwrap_err();
    assert_eq!(upstream.count("/api/v2/album/Nope!images"), 2);
}

// == EXIF ==

#[tokio::test]
async fn test_exif_lookup_and_null_on_failure() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let exif = repo.get_image_exif("full-0").await.unwrap();
    assert_eq!(exif.camera.as_deref(), Some("X-T5"));
    assert_eq!(exif.lens.as_deref(), Some("XF23mmF2"));
    assert_eq!(exif.iso, Some(160));

    assert!(repo.get_image_exif("bare-0").await.is_none());
    assert!(repo.get_image_exif("full-0").await.is_some());
    assert_eq!(upstream.count("/api/v2/image/full-0!metadata"), 1);
}

// == Shutdown ==

#[tokio::test]
async fn test_shutdown_cancels_in_flight_fetch() {
    let upstream = MockUpstream::start(gallery_api).await;
    let repo = repository(&upstream);

    let pending = {
        let repo = repo.clone();
        tokio::spawn(async move { repo.list_album_images("A1").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    repo.shutdown();

    assert_eq!(pending.await.unwrap().unwrap_err(), GalleryError::Cancelled);
    assert!(repo.cache_stats().keys.is_empty());
}
