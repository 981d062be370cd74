//! Helpers shared by the unit tests: sample images and a fake image API.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use base64::Engine;
use base64::engine::general_purpose;
use serde_json::json;

use crate::config::AppConfig;

/// A small solid-colour image in the requested format.
pub(crate) fn sample_image(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 90]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

/// What the fake API answers with.
#[derive(Clone, Copy, Debug)]
pub(crate) enum UpstreamMode {
    /// `b64_json` payload
    Inline,
    /// a URL pointing back at the fake server
    Url,
    /// a URL that answers 404
    UrlGone,
    /// HTTP 500
    Fail,
}

#[derive(Clone)]
struct FakeState {
    mode: UpstreamMode,
    base_url: String,
    image: Arc<Vec<u8>>,
    calls: Arc<AtomicUsize>,
    fields: Arc<Mutex<Vec<String>>>,
}

/// Handle on a running fake API.
pub(crate) struct FakeUpstream {
    /// `http://127.0.0.1:{port}/v1`
    pub(crate) api_base_url: String,
    /// What a successful generation returns
    pub(crate) image: Arc<Vec<u8>>,
    calls: Arc<AtomicUsize>,
    fields: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    /// Number of `images/edits` calls received.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Multipart field names of the last call.
    pub(crate) fn last_fields(&self) -> Vec<String> {
        self.fields.lock().map(|fields| fields.clone()).unwrap_or_default()
    }

    /// A config pointing at this fake, storing under `root`.
    pub(crate) fn config(&self, root: &std::path::Path) -> AppConfig {
        AppConfig::new(&self.api_base_url, "sk-test", "letmein")
            .with_dirs(root.join("data"), root.join("content"))
    }
}

async fn edits_handler(State(state): State<FakeState>, mut multipart: Multipart) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let mut names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        names.push(field.name().unwrap_or_default().to_string());
        let _ = field.bytes().await;
    }
    if let Ok(mut fields) = state.fields.lock() {
        *fields = names;
    }

    match state.mode {
        UpstreamMode::Inline => axum::Json(json!({
            "data": [{ "b64_json": general_purpose::STANDARD.encode(state.image.as_slice()) }]
        }))
        .into_response(),
        UpstreamMode::Url => axum::Json(json!({
            "data": [{ "url": format!("{}/files/result.png", state.base_url) }]
        }))
        .into_response(),
        UpstreamMode::UrlGone => axum::Json(json!({
            "data": [{ "url": format!("{}/files/missing.png", state.base_url) }]
        }))
        .into_response(),
        UpstreamMode::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "error": { "message": "model exploded" } })),
        )
            .into_response(),
    }
}

async fn file_handler(State(state): State<FakeState>) -> Vec<u8> {
    state.image.as_ref().clone()
}

/// Starts a fake image API on a random local port.
pub(crate) async fn spawn_upstream(mode: UpstreamMode) -> FakeUpstream {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let state = FakeState {
        mode,
        base_url: base_url.clone(),
        image: Arc::new(sample_image(image::ImageFormat::Png)),
        calls: Arc::new(AtomicUsize::new(0)),
        fields: Arc::new(Mutex::new(Vec::new())),
    };
    let handle = FakeUpstream {
        api_base_url: format!("{base_url}/v1"),
        image: state.image.clone(),
        calls: state.calls.clone(),
        fields: state.fields.clone(),
    };
    let app = Router::new()
        .route("/v1/images/edits", post(edits_handler))
        .route("/files/result.png", get(file_handler))
        .route(
            "/files/missing.png",
            get(|| async { StatusCode::NOT_FOUND }),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    handle
}
