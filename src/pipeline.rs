//! The generation pipeline shared by every style.
//!
//! A request goes through prompt building, PNG re-encoding, one call to the
//! image API, an optional download of the result, artifact persistence and
//! finally a best-effort metadata write. Any failure short-circuits into a
//! failed [`GenerationResult`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{ImageClient, InputImage, RawGenerationResponse, normalize_image_to_png};
use crate::config::AppConfig;
use crate::constants::IMAGE_SIZE;
use crate::download::download_bytes;
use crate::error::GenerationError;
use crate::metadata::{
    GeneratedImageInfo, GenerationInfo, GenerationMetadataRecord, MetadataStore,
    OriginalImageInfo,
};
use crate::prompt::{PromptParams, build_prompt};
use crate::storage::{ArtifactStore, PersistedArtifact, url_for};
use crate::styles::{Quality, StyleConfig};

/// One generation request.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Catalog entry to use
    pub style: &'static StyleConfig,
    /// Uploaded photos, in the order the style lists its roles
    pub input_images: Vec<InputImage>,
    /// Free text appended to the prompt, may be empty
    pub extra_details: String,
    /// Substituted into the two-image template
    pub celebrity_name: Option<String>,
    /// Requested quality
    pub quality: Quality,
}

/// Why a generation failed, used to pick the HTTP status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// One of the uploads could not be decoded
    InvalidInput,
    /// Upstream, download or storage problem
    Generation,
}

/// The branch-specific half of a [`GenerationResult`].
#[derive(Clone, Debug, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum GenerationOutcome {
    /// The image was generated and stored
    Success {
        /// Public URL of the generated image
        image_url: String,
        /// File name under the artifact root
        file_name: String,
        /// The prompt that was sent
        prompt: String,
    },
    /// Something went wrong
    Failure {
        /// Human-readable message
        error: String,
        /// Not serialized
        #[serde(skip)]
        kind: FailureKind,
    },
}

/// JSON envelope returned by the generation endpoints.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    success: bool,
    #[serde(flatten)]
    outcome: GenerationOutcome,
    /// Seconds, two decimals
    pub generation_time: String,
    /// Style that was requested
    pub style_id: String,
}

impl GenerationResult {
    fn new(outcome: GenerationOutcome, elapsed: Duration, style_id: &str) -> Self {
        Self {
            success: matches!(outcome, GenerationOutcome::Success { .. }),
            outcome,
            generation_time: format_elapsed(elapsed),
            style_id: style_id.to_string(),
        }
    }

    /// True when an image was produced.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The branch-specific fields.
    pub fn outcome(&self) -> &GenerationOutcome {
        &self.outcome
    }

    /// File name of the generated image, when there is one.
    pub fn file_name(&self) -> Option<&str> {
        match &self.outcome {
            GenerationOutcome::Success { file_name, .. } => Some(file_name),
            GenerationOutcome::Failure { .. } => None,
        }
    }

    /// Failure kind, when the generation failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            GenerationOutcome::Success { .. } => None,
            GenerationOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Seconds with two decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}

struct Completed {
    artifact: PersistedArtifact,
    prompt: String,
}

/// Runs generations against one image API and one storage layout.
#[derive(Clone, Debug)]
pub struct Pipeline {
    client: ImageClient,
    store: ArtifactStore,
    metadata: MetadataStore,
}

impl Pipeline {
    /// Wires the pieces together.
    pub fn new(client: ImageClient, store: ArtifactStore, metadata: MetadataStore) -> Self {
        Self {
            client,
            store,
            metadata,
        }
    }

    /// Builds the client and stores from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, GenerationError> {
        Ok(Self::new(
            ImageClient::new(&config.api)?,
            ArtifactStore::new(&config.data_dir),
            MetadataStore::new(&config.content_dir, &config.data_dir),
        ))
    }

    /// Where artifacts are written.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Where metadata records are written.
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Runs one generation to completion. Never returns an error, failures
    /// are reported in the result.
    #[instrument(level = "info", skip_all, fields(style = request.style.id))]
    pub async fn run(&self, request: GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        let style_id = request.style.id;
        info!("Starting generation with {} image(s)", request.input_images.len());

        let outcome = match self.execute(&request, started).await {
            Ok(completed) => {
                info!("Generation finished: {}", completed.artifact.file_name);
                GenerationOutcome::Success {
                    image_url: url_for(&completed.artifact.file_name),
                    file_name: completed.artifact.file_name,
                    prompt: completed.prompt,
                }
            }
            Err(err) => {
                error!("Generation failed: {err}");
                let kind = match err {
                    GenerationError::InvalidImage(_) => FailureKind::InvalidInput,
                    _ => FailureKind::Generation,
                };
                GenerationOutcome::Failure {
                    error: err.to_string(),
                    kind,
                }
            }
        };
        GenerationResult::new(outcome, started.elapsed(), style_id)
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        started: Instant,
    ) -> Result<Completed, GenerationError> {
        let style = request.style;
        let params = PromptParams {
            celebrity_name: request.celebrity_name.as_deref(),
        };
        let prompt = build_prompt(style, &params, &request.extra_details);
        debug!("Prompt: {prompt}");

        let encoded = request
            .input_images
            .iter()
            .map(|input| {
                Ok(InputImage {
                    role: input.role,
                    bytes: normalize_image_to_png(&input.bytes)?,
                })
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;

        let response = self
            .client
            .invoke_generation(&prompt, &encoded, request.quality, style.model)
            .await?;
        let api_time = format_elapsed(started.elapsed());
        debug!("Image API answered after {api_time}s");

        let image_bytes = match response {
            RawGenerationResponse::Inline(bytes) => bytes,
            RawGenerationResponse::Remote(url) => {
                debug!("Downloading generated image from {url}");
                download_bytes(self.client.http(), &url).await?
            }
        };

        let artifact = self
            .store
            .persist(&image_bytes, &request.input_images, style.id)
            .await?;

        let record = build_record(request, &prompt, &artifact, api_time);
        let report = self.metadata.write(&record).await;
        if !report.is_complete() {
            warn!("Metadata for {} was only partially saved", artifact.file_name);
        }

        Ok(Completed { artifact, prompt })
    }
}

fn build_record(
    request: &GenerationRequest,
    prompt: &str,
    artifact: &PersistedArtifact,
    generation_time: String,
) -> GenerationMetadataRecord {
    let style = request.style;
    let now = Utc::now();

    let extra_details = if request.extra_details.trim().is_empty() {
        style.default_details.to_string()
    } else {
        request.extra_details.clone()
    };
    let celebrity_name = style
        .has_celebrity()
        .then(|| request.celebrity_name.clone().unwrap_or_default());
    let extras = style
        .extras
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();
    let original_images: BTreeMap<String, OriginalImageInfo> = artifact
        .originals
        .iter()
        .map(|original| {
            (
                original.role.as_str().to_string(),
                OriginalImageInfo {
                    url: url_for(&original.file_name),
                    file_name: original.file_name.clone(),
                    size: original.size,
                },
            )
        })
        .collect();

    GenerationMetadataRecord {
        generated_image: GeneratedImageInfo {
            file_name: artifact.file_name.clone(),
            url: url_for(&artifact.file_name),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            generation_time,
            size: artifact.size,
        },
        original_images,
        generation: GenerationInfo {
            style_id: style.id.to_string(),
            kind: style.id.to_string(),
            theme: style.theme.to_string(),
            extra_details,
            prompt: prompt.to_string(),
            model: style.model.to_string(),
            quality: request.quality.as_str().to_string(),
            size: IMAGE_SIZE.to_string(),
            celebrity_name,
            extras,
        },
        timestamp: now.timestamp_millis(),
        version: crate::constants::METADATA_VERSION.to_string(),
    }
}
