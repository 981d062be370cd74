//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::info;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum SnapError {
    /// When you didn't do the right thing, with a message for the user
    BadRequest(String),
    /// Missing or invalid session
    Unauthorized,
    /// The request tried to reach outside the artifact root
    Forbidden,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for SnapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "Bad request: {message}"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Forbidden => write!(f, "Access denied"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for SnapError {}

impl From<std::io::Error> for SnapError {
    fn from(err: std::io::Error) -> Self {
        SnapError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for SnapError {
    fn from(err: axum::http::Error) -> Self {
        SnapError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(err: serde_json::Error) -> Self {
        SnapError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for SnapError {
    fn from(err: tower_sessions::session::Error) -> Self {
        SnapError::InternalServerError(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for SnapError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        SnapError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Failures inside the generation pipeline.
#[derive(Debug)]
pub enum GenerationError {
    /// An input image could not be decoded or re-encoded
    InvalidImage(String),
    /// The image API failed or answered with something unusable
    Upstream(String),
    /// Fetching the temporary result URL failed
    Download(String),
    /// Writing the generated image failed
    Storage(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImage(message) => write!(f, "Invalid input image: {message}"),
            Self::Upstream(message) => write!(f, "Image generation failed: {message}"),
            Self::Download(message) => write!(f, "Downloading the generated image failed: {message}"),
            Self::Storage(message) => write!(f, "Saving the generated image failed: {message}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl IntoResponse for SnapError {
    fn into_response(self) -> Response {
        match self {
            SnapError::BadRequest(message) => {
                info!("Bad request received: {message}");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "error": message })),
                )
                    .into_response()
            }
            SnapError::Unauthorized => {
                info!("Unauthorized request received");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "success": false,
                        "error": "Unauthorized: invalid or missing session."
                    })),
                )
                    .into_response()
            }
            SnapError::Forbidden => {
                info!("Rejected path outside the artifact root");
                (StatusCode::FORBIDDEN, "Access denied").into_response()
            }
            SnapError::NotFound(what) => {
                tracing::error!("404 {what}");
                (StatusCode::NOT_FOUND, "File not found").into_response()
            }
            SnapError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
