//! Metadata records stored next to every generated image.
//!
//! Each record is written twice: the canonical copy in the content directory,
//! then a mirror under `{data_dir}/metadata/` that older readers still use.
//! Writing is best-effort, a failed copy is logged and the generation still
//! succeeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{METADATA_DIR_NAME, METADATA_VERSION};
use crate::error::SnapError;
use crate::storage::base_name;

/// The generated image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageInfo {
    /// File name under the artifact root
    pub file_name: String,
    /// URL it is served from
    #[serde(default)]
    pub url: String,
    /// RFC 3339 creation time
    #[serde(default)]
    pub created_at: String,
    /// Seconds the API call took, two decimals
    #[serde(default = "default_generation_time")]
    pub generation_time: String,
    /// Bytes on disk
    #[serde(default)]
    pub size: u64,
}

/// One of the uploaded photos.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalImageInfo {
    /// File name under the artifact root
    pub file_name: String,
    /// URL it is served from
    #[serde(default)]
    pub url: String,
    /// Bytes on disk
    #[serde(default)]
    pub size: u64,
}

/// The parameters the image was generated with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInfo {
    /// Catalog style
    #[serde(default)]
    pub style_id: String,
    /// Same as the style id, kept for older readers
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Theme tag
    #[serde(default)]
    pub theme: String,
    /// User text, or the style default when the user left it empty
    #[serde(default)]
    pub extra_details: String,
    /// Exact prompt sent
    #[serde(default)]
    pub prompt: String,
    /// Model identifier
    #[serde(default)]
    pub model: String,
    /// `medium` or `high`
    #[serde(default)]
    pub quality: String,
    /// Requested output size
    #[serde(default)]
    pub size: String,
    /// Only set by the two-image style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebrity_name: Option<String>,
    /// Style-specific extras such as `scale` or `setting`
    #[serde(flatten)]
    pub extras: BTreeMap<String, serde_json::Value>,
}

/// A full metadata record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadataRecord {
    /// The generated image
    pub generated_image: GeneratedImageInfo,
    /// Uploaded photos keyed by role
    #[serde(default)]
    pub original_images: BTreeMap<String, OriginalImageInfo>,
    /// Generation parameters
    #[serde(default)]
    pub generation: GenerationInfo,
    /// Epoch millis, used to order the gallery
    #[serde(default)]
    pub timestamp: i64,
    /// Free-form schema version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_generation_time() -> String {
    "0".to_string()
}

fn default_version() -> String {
    METADATA_VERSION.to_string()
}

impl GenerationMetadataRecord {
    /// Base name shared by every file of this generation.
    pub fn base_name(&self) -> &str {
        base_name(&self.generated_image.file_name)
    }
}

/// Which copies of a record made it to disk.
#[derive(Debug, Default)]
pub struct MetadataWriteReport {
    /// Canonical copy, when written
    pub canonical: Option<PathBuf>,
    /// Legacy mirror, when written
    pub mirror: Option<PathBuf>,
}

impl MetadataWriteReport {
    /// True when both copies were written.
    pub fn is_complete(&self) -> bool {
        self.canonical.is_some() && self.mirror.is_some()
    }
}

/// Writes and reads metadata records.
#[derive(Clone, Debug)]
pub struct MetadataStore {
    content_dir: PathBuf,
    mirror_dir: PathBuf,
}

impl MetadataStore {
    /// `content_dir` holds the canonical copies, the mirror goes under
    /// `{data_dir}/metadata`.
    pub fn new(content_dir: impl Into<PathBuf>, data_dir: &Path) -> Self {
        Self {
            content_dir: content_dir.into(),
            mirror_dir: data_dir.join(METADATA_DIR_NAME),
        }
    }

    /// Canonical directory.
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Legacy mirror directory.
    pub fn mirror_dir(&self) -> &Path {
        &self.mirror_dir
    }

    /// Canonical path of a record.
    pub fn canonical_path(&self, base_name: &str) -> PathBuf {
        self.content_dir.join(format!("{base_name}.json"))
    }

    /// Mirror path of a record.
    pub fn mirror_path(&self, base_name: &str) -> PathBuf {
        self.mirror_dir.join(format!("{base_name}_metadata.json"))
    }

    /// Serializes the record once and writes the same bytes to both places.
    /// Never fails; problems are logged as warnings.
    pub async fn write(&self, record: &GenerationMetadataRecord) -> MetadataWriteReport {
        let mut report = MetadataWriteReport::default();
        let json = match serde_json::to_vec_pretty(record) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize metadata for {}: {err}", record.generated_image.file_name);
                return report;
            }
        };

        let base_name = record.base_name();
        let canonical = self.canonical_path(base_name);
        report.canonical = write_copy(&self.content_dir, &canonical, &json).await;
        let mirror = self.mirror_path(base_name);
        report.mirror = write_copy(&self.mirror_dir, &mirror, &json).await;
        report
    }
}

async fn write_copy(dir: &Path, path: &Path, json: &[u8]) -> Option<PathBuf> {
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        warn!("Failed to create metadata directory {}: {err}", dir.display());
        return None;
    }
    match tokio::fs::write(path, json).await {
        Ok(()) => {
            debug!("Metadata saved: {}", path.display());
            Some(path.to_path_buf())
        }
        Err(err) => {
            warn!("Failed to write metadata {}: {err}", path.display());
            None
        }
    }
}

/// Reads one record, filling in defaults for missing optional fields.
pub async fn read_record(path: &Path) -> Result<GenerationMetadataRecord, SnapError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_record(file_name: &str, timestamp: i64) -> GenerationMetadataRecord {
        GenerationMetadataRecord {
            generated_image: GeneratedImageInfo {
                file_name: file_name.to_string(),
                url: format!("/api/images/{file_name}"),
                created_at: "2026-10-19T10:00:00Z".to_string(),
                generation_time: "12.34".to_string(),
                size: 42,
            },
            original_images: BTreeMap::new(),
            generation: GenerationInfo {
                style_id: "figure-collector".to_string(),
                kind: "figure-collector".to_string(),
                theme: "collectible-figure".to_string(),
                extras: BTreeMap::from([("scale".to_string(), json!("1/7"))]),
                ..Default::default()
            },
            timestamp,
            version: "1.0".to_string(),
        }
    }

    #[test]
    fn serializes_in_camel_case_with_flattened_extras() {
        let value = serde_json::to_value(sample_record("figure-collector_1_abcdef.png", 1)).unwrap();
        assert_eq!(value["generatedImage"]["fileName"], "figure-collector_1_abcdef.png");
        assert_eq!(value["generatedImage"]["generationTime"], "12.34");
        assert_eq!(value["generation"]["type"], "figure-collector");
        assert_eq!(value["generation"]["scale"], "1/7");
        assert!(value["generation"].get("celebrityName").is_none());
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let raw = r#"{"generatedImage":{"fileName":"x_1_abcdef.png"},"generation":{"styleId":"x"}}"#;
        let record: GenerationMetadataRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.generated_image.generation_time, "0");
        assert_eq!(record.generation.celebrity_name, None);
        assert!(record.original_images.is_empty());
        assert_eq!(record.timestamp, 0);
        assert_eq!(record.version, "1.0");
    }

    #[tokio::test]
    async fn both_copies_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("content"), &dir.path().join("data"));
        let record = sample_record("figure-collector_1_abcdef.png", 5);

        let report = store.write(&record).await;
        assert!(report.is_complete());

        let canonical = tokio::fs::read(store.canonical_path("figure-collector_1_abcdef"))
            .await
            .unwrap();
        let mirror = tokio::fs::read(store.mirror_path("figure-collector_1_abcdef"))
            .await
            .unwrap();
        assert_eq!(canonical, mirror);
        assert_eq!(
            read_record(&store.mirror_path("figure-collector_1_abcdef"))
                .await
                .unwrap(),
            record
        );
    }

    #[tokio::test]
    async fn unwritable_directory_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // a plain file where the content directory should be
        let blocked = dir.path().join("content");
        tokio::fs::write(&blocked, b"").await.unwrap();
        let store = MetadataStore::new(&blocked, &dir.path().join("data"));

        let report = store.write(&sample_record("a_1_abcdef.png", 1)).await;
        assert!(report.canonical.is_none());
        assert!(report.mirror.is_some());
        assert!(!report.is_complete());
    }
}
