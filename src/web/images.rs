use std::path::Path as StdPath;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED, X_CONTENT_TYPE_OPTIONS,
};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use httpdate::{fmt_http_date, parse_http_date};
use std::io::ErrorKind;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::AppState;
use crate::constants::{IMAGE_CACHE_CONTROL, STREAM_THRESHOLD_BYTES, X_IMAGE_GENERATED};
use crate::error::SnapError;

/// Cache headers derived from file metadata.
#[derive(Clone, Debug)]
pub(crate) struct ImageCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl ImageCacheHeaders {
    /// Builds cache headers from filesystem metadata.
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let etag = build_etag(metadata.len(), modified_at);
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }

    pub(crate) fn etag(&self) -> Option<&HeaderValue> {
        self.etag.as_ref()
    }

    pub(crate) fn last_modified(&self) -> Option<&HeaderValue> {
        self.last_modified.as_ref()
    }
}

/// Applies the long-lived cache headers to a response builder.
pub(crate) fn apply_cache_headers(mut builder: Builder, cache: &ImageCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, IMAGE_CACHE_CONTROL);
    if let Some(etag) = cache.etag() {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = cache.last_modified() {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
pub(crate) fn is_not_modified(headers: &HeaderMap, cache: &ImageCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if let Ok(value) = if_none_match.to_str() {
            let value = value.trim();
            if value == "*" {
                return true;
            }
            if let Some(etag) = cache.etag().and_then(|value| value.to_str().ok())
                && value.split(',').any(|candidate| candidate.trim() == etag)
            {
                return true;
            }
        }
        return false;
    }

    if let (Some(if_modified_since), Some(modified_at)) =
        (headers.get(IF_MODIFIED_SINCE), cache.modified_at)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
        && modified_at <= since
    {
        return true;
    }

    false
}

/// Builds a 304 response that keeps the cache headers and has no body.
pub(crate) fn not_modified_response(cache: &ImageCacheHeaders) -> Result<Response, SnapError> {
    let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    let builder = apply_cache_headers(builder, cache);
    builder.body(Body::empty()).map_err(SnapError::from)
}

fn build_etag(size: u64, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = match modified_at {
        Some(modified) => modified
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string()),
        None => "0".to_string(),
    };
    let value = format!("W/\"{}-{}\"", size, suffix);
    HeaderValue::from_str(&value).ok()
}

/// Content type by file extension.
pub(crate) fn content_type_for(path: &StdPath) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Serves a file from under the artifact root.
#[instrument(level = "debug", skip(state, headers))]
pub(crate) async fn serve_artifact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Response, SnapError> {
    let file_path = state.store().resolve(&path).await?;
    let metadata = match tokio::fs::metadata(&file_path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(SnapError::NotFound(path)),
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(SnapError::NotFound(path)),
        Err(err) => return Err(SnapError::from(err)),
    };

    let cache_headers = ImageCacheHeaders::from_metadata(&metadata);
    if is_not_modified(&headers, &cache_headers) {
        return not_modified_response(&cache_headers);
    }

    let builder = Response::builder()
        .header(CONTENT_TYPE, content_type_for(&file_path))
        .header(CONTENT_LENGTH, metadata.len())
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(X_IMAGE_GENERATED, "true");
    let builder = apply_cache_headers(builder, &cache_headers);

    let body = if metadata.len() > STREAM_THRESHOLD_BYTES {
        debug!("Streaming {} ({} bytes)", file_path.display(), metadata.len());
        let file = tokio::fs::File::open(&file_path).await?;
        Body::from_stream(ReaderStream::new(file))
    } else {
        Body::from(tokio::fs::read(&file_path).await?)
    };
    builder.body(body).map_err(SnapError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn cache_for_file() -> (tempfile::TempDir, ImageCacheHeaders) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        tokio::fs::write(&path, b"1234").await.unwrap();
        let metadata = tokio::fs::metadata(&path).await.unwrap();
        (dir, ImageCacheHeaders::from_metadata(&metadata))
    }

    #[tokio::test]
    async fn etag_matches_if_none_match() {
        let (_dir, cache) = cache_for_file().await;
        let etag = cache.etag().unwrap().to_str().unwrap().to_string();
        assert!(etag.starts_with("W/\"4-"));

        let mut headers = HeaderMap::new();
        headers.insert(
            IF_NONE_MATCH,
            HeaderValue::from_str(&format!("\"other\", {etag}")).unwrap(),
        );
        assert!(is_not_modified(&headers, &cache));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"other\""));
        assert!(!is_not_modified(&headers, &cache));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("*"));
        assert!(is_not_modified(&headers, &cache));
    }

    #[tokio::test]
    async fn not_modified_has_no_body() {
        let (_dir, cache) = cache_for_file().await;
        let response = not_modified_response(&cache).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            IMAGE_CACHE_CONTROL
        );
        assert!(response.headers().get(ETAG).is_some());
    }

    #[test]
    fn content_types_by_extension() {
        let cases = [
            ("a.png", "image/png"),
            ("a.JPG", "image/jpeg"),
            ("a.jpeg", "image/jpeg"),
            ("a.webp", "image/webp"),
            ("a.gif", "image/gif"),
            ("a.svg", "image/svg+xml"),
            ("metadata/a_metadata.json", "application/json"),
            ("a.txt", "text/plain"),
            ("a.bin", "application/octet-stream"),
            ("noext", "application/octet-stream"),
        ];
        for (path, expected) in cases {
            assert_eq!(content_type_for(StdPath::new(path)), expected, "{path}");
        }
    }
}
