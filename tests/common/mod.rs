//! In-process mock of the upstream API.
//!
//! Binds an axum server on an ephemeral port, records every request and
//! answers from a test-provided responder.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use gallery_mirror::config::{Credentials, RetryPolicy};
use gallery_mirror::transport::oauth::{self, SignableRequest};
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};

// == Recorded Requests ==

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    /// Path plus raw query string, as received
    pub path_and_query: String,
    pub query: HashMap<String, String>,
    pub authorization: String,
}

impl RecordedRequest {
    pub fn oauth_param(&self, name: &str) -> Option<&str> {
        oauth::header_param(&self.authorization, name)
    }
}

// == Replies ==

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    /// 200 with `payload` wrapped in the response envelope.
    pub fn ok(payload: Value) -> Self {
        Self::raw(
            StatusCode::OK,
            json!({ "Response": payload, "Code": 200, "Message": "Ok" }).to_string(),
        )
    }

    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&RecordedRequest, usize) -> MockReply + Send + Sync;

#[derive(Clone)]
struct Inner {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Arc<Responder>,
}

// == Mock Upstream ==

pub struct MockUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    /// Starts the server. `responder` receives each request and the number
    /// of requests received before it.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest, usize) -> MockReply + Send + Sync + 'static,
    {
        let inner = Inner {
            requests: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        };
        let requests = inner.requests.clone();
        let app = Router::new().fallback(respond).with_state(inner);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }

    /// Recomputes the signature of `request` and compares it with the one
    /// the client sent.
    pub fn signature_valid(&self, request: &RecordedRequest, credentials: &Credentials) -> bool {
        let url = Url::parse(&format!("{}{}", self.base_url, request.path_and_query)).unwrap();
        let (Some(timestamp), Some(nonce)) = (
            request.oauth_param("oauth_timestamp"),
            request.oauth_param("oauth_nonce"),
        ) else {
            return false;
        };
        let expected = oauth::sign(
            SignableRequest::get(&url),
            credentials,
            timestamp.parse().unwrap(),
            nonce,
        );
        oauth::header_param(&expected, "oauth_signature") == request.oauth_param("oauth_signature")
    }
}

async fn respond(
    State(inner): State<Inner>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let request = RecordedRequest {
        path: uri.path().to_string(),
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        query,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };
    let seen = {
        let mut requests = inner.requests.lock();
        requests.push(request.clone());
        requests.len() - 1
    };

    let reply = (inner.responder)(&request, seen);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

// == Fixtures ==

pub fn credentials() -> Credentials {
    Credentials::new("consumer", "consumer-secret", "token", "token-secret")
}

/// Three attempts, millisecond backoff.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
    }
}
