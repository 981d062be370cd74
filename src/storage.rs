//! Filesystem storage for generated images and the photos they came from.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use tracing::{debug, info};

use crate::client::InputImage;
use crate::constants::{FILE_SUFFIX_LENGTH, IMAGE_URL_PREFIX};
use crate::error::{GenerationError, SnapError};
use crate::styles::ImageRole;

/// An input photo saved next to its generated image.
#[derive(Clone, Debug)]
pub struct StoredOriginal {
    /// Role of the photo
    pub role: ImageRole,
    /// File name under the artifact root
    pub file_name: String,
    /// Number of bytes written
    pub size: u64,
}

/// What [`ArtifactStore::persist`] wrote.
#[derive(Clone, Debug)]
pub struct PersistedArtifact {
    /// `{style}_{millis}_{suffix}.png`
    pub file_name: String,
    /// The file name without `.png`, shared by every related file
    pub base_name: String,
    /// Full path of the generated image
    pub path: PathBuf,
    /// Size of the generated image in bytes
    pub size: u64,
    /// Originals in upload order
    pub originals: Vec<StoredOriginal>,
}

/// The artifact root directory.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Wraps a root directory; nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The artifact root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a file directly under the root.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Returns true when `file_name` exists as a regular file under the root.
    pub async fn contains(&self, file_name: &str) -> bool {
        match tokio::fs::metadata(self.path_for(file_name)).await {
            Ok(metadata) => metadata.is_file(),
            Err(_) => false,
        }
    }

    /// Writes the generated image and then every original photo, unmodified.
    pub async fn persist(
        &self,
        image_bytes: &[u8],
        inputs: &[InputImage],
        style_id: &str,
    ) -> Result<PersistedArtifact, GenerationError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            GenerationError::Storage(format!("Failed to create {}: {err}", self.root.display()))
        })?;

        let file_name = generate_file_name(style_id);
        let base_name = base_name(&file_name).to_string();
        let path = self.path_for(&file_name);
        tokio::fs::write(&path, image_bytes).await.map_err(|err| {
            GenerationError::Storage(format!("Failed to write {}: {err}", path.display()))
        })?;
        info!("Generated image saved: {}", path.display());

        let mut originals = Vec::with_capacity(inputs.len());
        for input in inputs {
            let original_name = original_file_name(&base_name, input.role);
            let original_path = self.path_for(&original_name);
            tokio::fs::write(&original_path, &input.bytes)
                .await
                .map_err(|err| {
                    GenerationError::Storage(format!(
                        "Failed to write {}: {err}",
                        original_path.display()
                    ))
                })?;
            debug!("Original {} image saved: {}", input.role, original_name);
            originals.push(StoredOriginal {
                role: input.role,
                file_name: original_name,
                size: input.bytes.len() as u64,
            });
        }

        Ok(PersistedArtifact {
            file_name,
            base_name,
            path,
            size: image_bytes.len() as u64,
            originals,
        })
    }

    /// Maps a request path onto a file strictly under the root.
    ///
    /// Only plain path segments are allowed, and when the target exists its
    /// canonical form must still live under the canonical root.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf, SnapError> {
        if relative.is_empty() {
            return Err(SnapError::BadRequest("File path not provided".to_string()));
        }
        let candidate = Path::new(relative);
        if !candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(SnapError::Forbidden);
        }

        let path = self.root.join(candidate);
        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(path),
            Err(err) => return Err(SnapError::from(err)),
        };
        match tokio::fs::canonicalize(&path).await {
            Ok(canonical) if !canonical.starts_with(&root) => Err(SnapError::Forbidden),
            Ok(_) => Ok(path),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(path),
            Err(err) => Err(SnapError::from(err)),
        }
    }
}

/// Public URL of a file under the artifact root.
pub fn url_for(file_name: &str) -> String {
    format!("{IMAGE_URL_PREFIX}/{file_name}")
}

/// `{style}_{millis}_{random}.png`
pub fn generate_file_name(style_id: &str) -> String {
    let suffix = Alphanumeric.sample_string(&mut rand::rng(), FILE_SUFFIX_LENGTH);
    format!("{style_id}_{}_{suffix}.png", Utc::now().timestamp_millis())
}

/// Strips the `.png` extension.
pub fn base_name(file_name: &str) -> &str {
    file_name.strip_suffix(".png").unwrap_or(file_name)
}

/// `{base}_{role}_original.png`
pub fn original_file_name(base_name: &str, role: ImageRole) -> String {
    format!("{base_name}_{role}_original.png")
}
