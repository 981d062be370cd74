//! HTTP surface: pages, JSON endpoints, the auth gate and file serving.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::constants::{AUTH_COOKIE_NAME, AUTH_SESSION_DAYS};
use crate::error::GenerationError;
use crate::gallery::{GalleryStats, list_artifacts};
use crate::metadata::MetadataStore;
use crate::pipeline::Pipeline;
use crate::storage::ArtifactStore;
use crate::styles::StyleConfig;

mod auth;
mod csrf;
mod flash;
mod generate;
mod images;
mod views;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    config: Arc<AppConfig>,
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub(crate) fn new(config: AppConfig) -> Result<Self, GenerationError> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        })
    }

    pub(crate) fn store(&self) -> &ArtifactStore {
        self.pipeline.store()
    }

    pub(crate) fn metadata(&self) -> &MetadataStore {
        self.pipeline.metadata()
    }
}

/// GET /api/styles
async fn styles_handler() -> impl IntoResponse {
    Json(StyleConfig::all())
}

/// GET /api/gallery
async fn gallery_handler(State(state): State<AppState>) -> impl IntoResponse {
    let images = list_artifacts(state.store(), state.metadata()).await;
    let stats = GalleryStats::from_entries(&images);
    Json(json!({
        "success": true,
        "images": images,
        "stats": stats,
    }))
}

/// GET /api/latest-image.json
async fn latest_image_handler(State(state): State<AppState>) -> impl IntoResponse {
    let images = list_artifacts(state.store(), state.metadata()).await;
    let body = match images.first() {
        Some(latest) => json!({
            "timestamp": latest.timestamp,
            "image": latest,
            "totalImages": images.len(),
            "imageId": latest.id,
        }),
        None => json!({
            "timestamp": Utc::now().timestamp_millis(),
            "image": null,
            "totalImages": 0,
        }),
    };
    ([(CACHE_CONTROL, "no-cache")], Json(body))
}

async fn stylesheet_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

pub(crate) fn create_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(AUTH_COOKIE_NAME)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(state.config.secure_cookies)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(AUTH_SESSION_DAYS)));

    let mut router = Router::new()
        .route("/", get(views::catalog_handler))
        .route("/static/styles.css", get(stylesheet_handler))
        .route("/login", get(auth::login_page))
        .route("/api/auth/login", post(auth::login_handler))
        .route(
            "/api/auth/logout",
            get(auth::logout_handler).post(auth::logout_handler),
        )
        .route("/generate/{style_id}", get(views::generate_page))
        .route("/api/generate/{style_id}", post(generate::generate_handler))
        .route("/api/styles", get(styles_handler))
        .route("/api/gallery", get(gallery_handler))
        .route("/api/latest-image.json", get(latest_image_handler))
        .route("/api/images/{*path}", get(images::serve_artifact));
    for (path, _) in generate::LEGACY_ROUTES {
        router = router.route(path, post(generate::legacy_generate_handler));
    }

    router
        .layer(axum::middleware::from_fn(auth::require_auth))
        .layer(session_layer)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listener and serves until the process is stopped.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    config: AppConfig,
) -> Result<(), anyhow::Error> {
    info!(
        "Storing images in {} and metadata in {}",
        config.data_dir.display(),
        config.content_dir.display()
    );
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
