//! Generation endpoints: the generic `/api/generate/{style_id}` and the
//! older one-path-per-style aliases.

use std::str::FromStr;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{MatchedPath, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, instrument};

use super::AppState;
use crate::client::InputImage;
use crate::error::SnapError;
use crate::pipeline::{FailureKind, GenerationRequest};
use crate::styles::{ImageRole, Quality, StyleConfig};

/// Older endpoints and the style each one maps to.
pub(crate) const LEGACY_ROUTES: &[(&str, &str)] = &[
    ("/api/generate", "que-paso-ayer-fiesta"),
    ("/api/generate-chibi", "chibi-sticker"),
    ("/api/generate-figure", "figure-collector"),
    ("/api/generate-buzz-cut", "buzz-cut-street"),
    ("/api/generate-film-noir", "film-noir-portrait"),
    ("/api/generate-editorial-portrait", "editorial-portrait"),
    ("/api/generate-lego-collection", "lego-collection"),
    ("/api/generate-polaroid-chibi", "polaroid-chibi"),
    ("/api/generate-yarn-doll", "yarn-doll"),
    ("/api/generate-pencil-sketch", "pencil-sketch"),
    ("/api/generate-instagram-chibi", "instagram-chibi"),
];

/// The multipart fields we understand.
#[derive(Debug, Default)]
struct GenerationForm {
    images: Vec<InputImage>,
    extra_details: String,
    celebrity_name: Option<String>,
    quality: Option<String>,
}

impl GenerationForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, SnapError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            if let Some(role) = ImageRole::from_field_name(&field_name) {
                let is_image = field
                    .content_type()
                    .is_some_and(|content_type| content_type.starts_with("image/"));
                if !is_image {
                    return Err(SnapError::BadRequest(format!(
                        "The {role} file must be an image"
                    )));
                }
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                debug!("Received {role} image, {} bytes", bytes.len());
                form.images.retain(|image| image.role != role);
                form.images.push(InputImage {
                    role,
                    bytes: bytes.to_vec(),
                });
                continue;
            }
            match field_name.as_str() {
                "extraDetails" | "extra_details" => form.extra_details = field.text().await?,
                "celebrityName" | "celebrity_name" => {
                    let name = field.text().await?;
                    form.celebrity_name = Some(name).filter(|name| !name.trim().is_empty());
                }
                "quality" => form.quality = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    /// Checks the form against the style and builds the pipeline request.
    fn into_request(self, style: &'static StyleConfig) -> Result<GenerationRequest, SnapError> {
        let quality = match self.quality.as_deref().map(str::trim) {
            None | Some("") => Quality::default(),
            Some(value) => Quality::from_str(value).map_err(SnapError::BadRequest)?,
        };

        let mut images = self.images;
        let mut input_images = Vec::with_capacity(style.required_roles.len());
        for role in style.required_roles {
            let position = images
                .iter()
                .position(|image| image.role == *role)
                .ok_or_else(|| SnapError::BadRequest(format!("Missing {role} image")))?;
            input_images.push(images.swap_remove(position));
        }

        Ok(GenerationRequest {
            style,
            input_images,
            extra_details: self.extra_details,
            celebrity_name: self.celebrity_name,
            quality,
        })
    }
}

async fn run_generation(
    state: &AppState,
    style_id: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, SnapError> {
    let style = StyleConfig::get(style_id)
        .ok_or_else(|| SnapError::BadRequest(format!("Unknown style '{style_id}'")))?;
    let multipart = multipart.map_err(|err| {
        debug!("Rejected generation body: {err}");
        SnapError::BadRequest("Content-Type must be multipart/form-data".to_string())
    })?;

    let request = GenerationForm::from_multipart(multipart)
        .await?
        .into_request(style)?;
    info!(
        "Generation requested: {} image(s), quality {}",
        request.input_images.len(),
        request.quality
    );

    let result = state.pipeline.run(request).await;
    let status = match result.failure_kind() {
        None => StatusCode::OK,
        Some(FailureKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(FailureKind::Generation) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Ok((status, Json(result)).into_response())
}

/// POST /api/generate/{style_id}
#[instrument(level = "info", skip_all, fields(style_id = %style_id))]
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    Path(style_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, SnapError> {
    run_generation(&state, &style_id, multipart).await
}

/// POST on one of the [`LEGACY_ROUTES`].
#[instrument(level = "info", skip_all, fields(path = matched.as_str()))]
pub(crate) async fn legacy_generate_handler(
    State(state): State<AppState>,
    matched: MatchedPath,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, SnapError> {
    let style_id = LEGACY_ROUTES
        .iter()
        .find(|(path, _)| *path == matched.as_str())
        .map(|(_, style_id)| *style_id)
        .ok_or_else(|| SnapError::NotFound(matched.as_str().to_string()))?;
    run_generation(&state, style_id, multipart).await
}
