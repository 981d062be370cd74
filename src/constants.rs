//! Shared constants

use std::path::PathBuf;
use std::sync::LazyLock;

/// The default place generated images and their originals go
pub static DEFAULT_DATA_DIR: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from("./data/generated"));

/// The default place the canonical metadata records go
pub static DEFAULT_CONTENT_DIR: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from("./content/generated-images"));

/// Sub-directory of the data dir holding the legacy metadata mirror.
pub const METADATA_DIR_NAME: &str = "metadata";

/// URL prefix the file-serving endpoint lives under.
pub const IMAGE_URL_PREFIX: &str = "/api/images";

/// Output size requested from the image API.
pub const IMAGE_SIZE: &str = "1024x1024";

/// Version tag written into every metadata record.
pub const METADATA_VERSION: &str = "1.0";

/// Length of the random part of artifact file names.
pub const FILE_SUFFIX_LENGTH: usize = 6;

/// Generated artifacts never change once written.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Files above this size are streamed instead of read into memory.
pub const STREAM_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// Marks responses carrying generated images.
pub const X_IMAGE_GENERATED: &str = "x-image-generated";

/// Name of the session cookie that gates the generation pages.
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Lifetime of an authenticated session, in days.
pub const AUTH_SESSION_DAYS: i64 = 7;

/// Path prefixes that need an authenticated session.
pub const PROTECTED_PREFIXES: &[&str] = &["/generate/", "/api/generate"];

/// Length of CSRF session tokens
pub const CSRF_TOKEN_LENGTH: usize = 32;
