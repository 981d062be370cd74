//! Lists past generations from their metadata records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::metadata::{GenerationMetadataRecord, MetadataStore, read_record};
use crate::storage::{ArtifactStore, url_for};
use crate::styles::{FALLBACK_STYLE_ID, StyleConfig};

/// An uploaded photo that is still on disk.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryOriginal {
    /// `person` or `celebrity`
    pub role: String,
    /// Where to fetch it
    pub url: String,
}

/// One past generation, ready for display.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    /// Base name, unique per generation
    pub id: String,
    /// File name of the generated image
    pub file_name: String,
    /// Where to fetch it
    pub image_url: String,
    /// Catalog style
    pub style_id: String,
    /// Epoch millis
    pub timestamp: i64,
    /// RFC 3339 creation time
    pub created_at: String,
    /// Bytes on disk
    pub size: u64,
    /// Seconds the API call took
    pub generation_time: String,
    /// Prompt that was sent
    pub prompt: String,
    /// User text or the style default
    pub extra_details: String,
    /// Only for the two-image style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebrity_name: Option<String>,
    /// Display title from the catalog
    pub display_title: String,
    /// Extra details, or the catalog subtitle when there are none
    pub display_subtitle: String,
    /// Display type from the catalog
    pub display_type: String,
    /// Catalog emoji
    pub emoji: String,
    /// Originals that can still be downloaded
    pub available_originals: Vec<GalleryOriginal>,
}

impl GalleryEntry {
    fn from_record(record: GenerationMetadataRecord, available: Vec<GalleryOriginal>) -> Self {
        let style = StyleConfig::get(&record.generation.style_id)
            .or_else(|| StyleConfig::get(FALLBACK_STYLE_ID));
        let (title, subtitle, kind, emoji) = match style {
            Some(style) => (
                style.display_title,
                style.display_subtitle,
                style.display_type,
                style.emoji,
            ),
            None => ("", "", "", ""),
        };

        let celebrity_name = record
            .generation
            .celebrity_name
            .clone()
            .filter(|name| !name.trim().is_empty());
        let display_title = match &celebrity_name {
            Some(name) => format!("{title}: {name}"),
            None => title.to_string(),
        };
        let display_subtitle = if record.generation.extra_details.trim().is_empty() {
            subtitle.to_string()
        } else {
            record.generation.extra_details.clone()
        };
        let image_url = if record.generated_image.url.is_empty() {
            url_for(&record.generated_image.file_name)
        } else {
            record.generated_image.url.clone()
        };

        Self {
            id: record.base_name().to_string(),
            image_url,
            style_id: record.generation.style_id,
            timestamp: record.timestamp,
            created_at: record.generated_image.created_at,
            size: record.generated_image.size,
            generation_time: record.generated_image.generation_time,
            prompt: record.generation.prompt,
            extra_details: record.generation.extra_details,
            celebrity_name,
            display_title,
            display_subtitle,
            display_type: kind.to_string(),
            emoji: emoji.to_string(),
            available_originals: available,
            file_name: record.generated_image.file_name,
        }
    }
}

/// Totals over the listed generations.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryStats {
    /// Number of generations
    pub total_images: usize,
    /// Sum of generated image sizes
    pub total_size: u64,
    /// Count per style id
    pub style_stats: BTreeMap<String, usize>,
    /// Creation time of the newest generation
    pub last_generated: Option<String>,
}

impl GalleryStats {
    /// Computes stats over entries sorted newest first.
    pub fn from_entries(entries: &[GalleryEntry]) -> Self {
        let mut style_stats = BTreeMap::new();
        for entry in entries {
            *style_stats.entry(entry.style_id.clone()).or_insert(0) += 1;
        }
        Self {
            total_images: entries.len(),
            total_size: entries.iter().map(|entry| entry.size).sum(),
            style_stats,
            last_generated: entries.first().map(|entry| entry.created_at.clone()),
        }
    }
}

async fn json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Can't read {}: {err}", dir.display());
            return files;
        }
    };
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    files.push(path);
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("Failed listing {}: {err}", dir.display());
                break;
            }
        }
    }
    files
}

/// Every generation whose image is still on disk, newest first.
///
/// Records come from the legacy mirror directory, or from the content
/// directory when the mirror is missing or empty.
pub async fn list_artifacts(store: &ArtifactStore, metadata: &MetadataStore) -> Vec<GalleryEntry> {
    let mut files = json_files(metadata.mirror_dir()).await;
    if files.is_empty() {
        debug!(
            "No records in {}, falling back to {}",
            metadata.mirror_dir().display(),
            metadata.content_dir().display()
        );
        files = json_files(metadata.content_dir()).await;
    }

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let record = match read_record(&path).await {
            Ok(record) => record,
            Err(err) => {
                warn!("Skipping unreadable metadata {}: {err}", path.display());
                continue;
            }
        };
        if !store.contains(&record.generated_image.file_name).await {
            debug!(
                "Skipping {}, image {} is gone",
                path.display(),
                record.generated_image.file_name
            );
            continue;
        }

        let mut available = Vec::new();
        for (role, original) in &record.original_images {
            if store.contains(&original.file_name).await {
                available.push(GalleryOriginal {
                    role: role.clone(),
                    url: url_for(&original.file_name),
                });
            }
        }
        entries.push(GalleryEntry::from_record(record, available));
    }

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tests::sample_record;
    use crate::metadata::{GenerationInfo, OriginalImageInfo};

    struct Fixture {
        _dir: tempfile::TempDir,
        store: ArtifactStore,
        metadata: MetadataStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let store = ArtifactStore::new(&data);
        let metadata = MetadataStore::new(dir.path().join("content"), &data);
        Fixture {
            _dir: dir,
            store,
            metadata,
        }
    }

    async fn add(fixture: &Fixture, record: &GenerationMetadataRecord) {
        tokio::fs::create_dir_all(fixture.store.root()).await.unwrap();
        tokio::fs::write(
            fixture.store.path_for(&record.generated_image.file_name),
            vec![0u8; record.generated_image.size as usize],
        )
        .await
        .unwrap();
        assert!(fixture.metadata.write(record).await.is_complete());
    }

    #[tokio::test]
    async fn lists_newest_first_and_skips_missing_images() {
        let fixture = fixture();
        add(&fixture, &sample_record("figure-collector_100_aaaaaa.png", 100)).await;
        add(&fixture, &sample_record("figure-collector_300_cccccc.png", 300)).await;
        add(&fixture, &sample_record("figure-collector_200_bbbbbb.png", 200)).await;
        // metadata without an image
        fixture
            .metadata
            .write(&sample_record("figure-collector_400_dddddd.png", 400))
            .await;
        // garbage record
        tokio::fs::write(fixture.metadata.mirror_dir().join("junk.json"), b"{")
            .await
            .unwrap();

        let entries = list_artifacts(&fixture.store, &fixture.metadata).await;
        let timestamps: Vec<i64> = entries.iter().map(|entry| entry.timestamp).collect();
        assert_eq!(timestamps, vec![300, 200, 100]);
        assert_eq!(entries[0].id, "figure-collector_300_cccccc");
        assert_eq!(entries[0].display_type, "Figure Collector");
    }

    #[tokio::test]
    async fn falls_back_to_the_content_directory() {
        let fixture = fixture();
        add(&fixture, &sample_record("figure-collector_1_aaaaaa.png", 1)).await;
        tokio::fs::remove_dir_all(fixture.metadata.mirror_dir())
            .await
            .unwrap();

        let entries = list_artifacts(&fixture.store, &fixture.metadata).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "figure-collector_1_aaaaaa.png");
    }

    #[tokio::test]
    async fn nothing_on_disk_is_an_empty_list() {
        let fixture = fixture();
        assert!(
            list_artifacts(&fixture.store, &fixture.metadata)
                .await
                .is_empty()
        );
        let stats = GalleryStats::from_entries(&[]);
        assert_eq!(stats.total_images, 0);
        assert_eq!(stats.last_generated, None);
    }

    #[tokio::test]
    async fn display_fields_and_available_originals() {
        let fixture = fixture();
        let mut record = sample_record("que-paso-ayer-fiesta_5_abcdef.png", 5);
        record.generation = GenerationInfo {
            style_id: "que-paso-ayer-fiesta".to_string(),
            celebrity_name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        };
        record.original_images.insert(
            "person".to_string(),
            OriginalImageInfo {
                file_name: "que-paso-ayer-fiesta_5_abcdef_person_original.png".to_string(),
                ..Default::default()
            },
        );
        record.original_images.insert(
            "celebrity".to_string(),
            OriginalImageInfo {
                file_name: "que-paso-ayer-fiesta_5_abcdef_celebrity_original.png".to_string(),
                ..Default::default()
            },
        );
        add(&fixture, &record).await;
        tokio::fs::write(
            fixture
                .store
                .path_for("que-paso-ayer-fiesta_5_abcdef_person_original.png"),
            b"p",
        )
        .await
        .unwrap();

        let entries = list_artifacts(&fixture.store, &fixture.metadata).await;
        let entry = &entries[0];
        assert_eq!(entry.display_title, "Party with a celebrity: Ada Lovelace");
        assert_eq!(entry.display_subtitle, "Epic party");
        assert_eq!(entry.available_originals.len(), 1);
        assert_eq!(entry.available_originals[0].role, "person");
    }

    #[tokio::test]
    async fn unknown_styles_use_the_fallback_display() {
        let fixture = fixture();
        let mut record = sample_record("retired-style_9_abcdef.png", 9);
        record.generation.style_id = "retired-style".to_string();
        record.generation.extra_details = "neon".to_string();
        add(&fixture, &record).await;

        let entries = list_artifacts(&fixture.store, &fixture.metadata).await;
        assert_eq!(entries[0].display_type, "AI Generation");
        assert_eq!(entries[0].display_subtitle, "neon");
        assert_eq!(entries[0].style_id, "retired-style");
    }

    #[tokio::test]
    async fn stats_cover_every_entry() {
        let fixture = fixture();
        add(&fixture, &sample_record("figure-collector_1_aaaaaa.png", 1)).await;
        let mut other = sample_record("yarn-doll_2_bbbbbb.png", 2);
        other.generation.style_id = "yarn-doll".to_string();
        other.generated_image.created_at = "2026-10-19T11:00:00Z".to_string();
        add(&fixture, &other).await;

        let entries = list_artifacts(&fixture.store, &fixture.metadata).await;
        let stats = GalleryStats::from_entries(&entries);
        assert_eq!(stats.total_images, 2);
        assert_eq!(stats.total_size, 84);
        assert_eq!(stats.style_stats["yarn-doll"], 1);
        assert_eq!(stats.style_stats["figure-collector"], 1);
        assert_eq!(stats.last_generated.as_deref(), Some("2026-10-19T11:00:00Z"));
    }
}
