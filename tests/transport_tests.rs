//! Integration Tests for the Signed Transport
//!
//! Drives `SignedTransport` against an in-process mock upstream: signing,
//! retry classification, timeouts and cancellation.

mod common;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use common::{credentials, fast_retry, MockReply, MockUpstream};
use gallery_mirror::config::RetryPolicy;
use gallery_mirror::transport::{FetchOptions, SignedTransport, Transport};
use gallery_mirror::GalleryError;
use serde_json::json;
use tokio_util::sync::CancellationToken;

// == Helper Functions ==

fn transport(upstream: &MockUpstream, retry: RetryPolicy) -> SignedTransport {
    SignedTransport::new(&upstream.base_url, credentials(), retry).unwrap()
}

// == Signing ==

#[tokio::test]
async fn test_request_is_signed_including_query() {
    let upstream = MockUpstream::start(|_, _| MockReply::ok(json!({ "ok": true }))).await;
    let transport = transport(&upstream, fast_retry());

    let options = FetchOptions::new()
        .with_query("start", 1)
        .with_query("count", 100)
        .with_query("_expand", "LargestImage,ImageSizeDetails");
    let payload = transport
        .fetch("/api/v2/album/Ab12!images", &options)
        .await
        .unwrap();

    assert_eq!(payload, json!({ "ok": true }));
    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/api/v2/album/Ab12!images");
    assert_eq!(request.query["count"], "100");
    assert_eq!(request.query["_expand"], "LargestImage,ImageSizeDetails");
    assert_eq!(request.oauth_param("oauth_consumer_key"), Some("consumer"));
    assert_eq!(request.oauth_param("oauth_token"), Some("token"));
    assert_eq!(request.oauth_param("oauth_signature_method"), Some("HMAC-SHA1"));
    assert!(upstream.signature_valid(request, &credentials()));
}

// == Retry Classification ==

#[tokio::test]
async fn test_rate_limit_retried_with_fresh_nonce() {
    let upstream = MockUpstream::start(|_, seen| {
        if seen < 2 {
            MockReply::raw(StatusCode::TOO_MANY_REQUESTS, "slow down")
        } else {
            MockReply::ok(json!({ "attempt": seen + 1 }))
        }
    })
    .await;
    let transport = transport(&upstream, fast_retry());

    let payload = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(payload["attempt"], 3);
    let requests = upstream.requests();
    assert_eq!(requests.len(), 3);

    let pairs: HashSet<(String, String)> = requests
        .iter()
        .map(|r| {
            (
                r.oauth_param("oauth_timestamp").unwrap().to_string(),
                r.oauth_param("oauth_nonce").unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(pairs.len(), 3);
    assert!(requests
        .iter()
        .all(|r| upstream.signature_valid(r, &credentials())));
}

#[tokio::test]
async fn test_rate_limit_budget_exhausted() {
    let upstream =
        MockUpstream::start(|_, _| MockReply::raw(StatusCode::TOO_MANY_REQUESTS, "")).await;
    let transport = transport(&upstream, fast_retry());

    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err, GalleryError::RateLimited { attempts: 3 });
    assert_eq!(upstream.requests().len(), 3);
}

#[tokio::test]
async fn test_forbidden_is_never_retried() {
    let upstream =
        MockUpstream::start(|_, _| MockReply::raw(StatusCode::FORBIDDEN, "signature invalid"))
            .await;
    let transport = transport(&upstream, fast_retry());

    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GalleryError::Authentication {
            status: 403,
            message: "signature invalid".to_string(),
        }
    );
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn test_server_error_surfaces_truncated_body() {
    let upstream = MockUpstream::start(|_, _| {
        MockReply::raw(StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(1000))
    })
    .await;
    let transport = transport(&upstream, fast_retry());

    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap_err();

    match err {
        GalleryError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn test_unreadable_body_is_retried() {
    let upstream = MockUpstream::start(|_, seen| {
        if seen == 0 {
            MockReply::raw(StatusCode::OK, "<html>gateway</html>")
        } else {
            MockReply::ok(json!([1, 2, 3]))
        }
    })
    .await;
    let transport = transport(&upstream, fast_retry());

    let payload = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(payload, json!([1, 2, 3]));
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn test_envelope_without_response_is_malformed() {
    let upstream = MockUpstream::start(|_, _| {
        MockReply::raw(StatusCode::OK, r#"{"Code":200,"Message":"Ok"}"#)
    })
    .await;
    let transport = transport(&upstream, fast_retry());

    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GalleryError::MalformedPayload(_)));
    assert_eq!(upstream.requests().len(), 1);
}

// == Timeouts and Cancellation ==

#[tokio::test]
async fn test_timeout_is_retried_then_surfaced() {
    let upstream = MockUpstream::start(|_, _| {
        MockReply::ok(json!({})).after(Duration::from_secs(3))
    })
    .await;
    let retry = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(5),
        request_timeout: Duration::from_millis(200),
    };
    let transport = transport(&upstream, retry);

    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new())
        .await
        .unwrap_err();

    match err {
        GalleryError::Transport(message) => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn test_cancel_during_backoff() {
    let upstream =
        MockUpstream::start(|_, _| MockReply::raw(StatusCode::TOO_MANY_REQUESTS, "")).await;
    let retry = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_secs(30),
        request_timeout: Duration::from_secs(5),
    };
    let transport = transport(&upstream, retry);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new().with_cancel(token))
        .await
        .unwrap_err();

    assert_eq!(err, GalleryError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let upstream = MockUpstream::start(|_, _| {
        MockReply::ok(json!({})).after(Duration::from_secs(3))
    })
    .await;
    let transport = transport(&upstream, fast_retry());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = transport
        .fetch("/api/v2!authuser", &FetchOptions::new().with_cancel(token))
        .await
        .unwrap_err();

    assert_eq!(err, GalleryError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(upstream.requests().len(), 1);
}
