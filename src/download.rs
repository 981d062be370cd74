//! Fetches generated images from the temporary URLs some models answer with.

use reqwest::StatusCode;
use tracing::{debug, info};
use url::Url;

use crate::error::GenerationError;

/// Downloads `url` into memory.
///
/// Only `http` and `https` are accepted; the scheme decides whether the
/// connection is plain or TLS. Anything but `200 OK` is a failure.
pub async fn download_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, GenerationError> {
    let parsed = Url::parse(url)
        .map_err(|err| GenerationError::Download(format!("Invalid URL {url}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(GenerationError::Download(format!(
                "Unsupported URL scheme '{other}'"
            )));
        }
    }

    debug!("Downloading generated image from {}", parsed);
    let resp = client
        .get(parsed)
        .send()
        .await
        .map_err(|err| GenerationError::Download(err.to_string()))?;

    let status = resp.status();
    if status != StatusCode::OK {
        return Err(GenerationError::Download(format!("HTTP error: {status}")));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|err| GenerationError::Download(format!("Failed to read body: {err}")))?;
    info!("Downloaded generated image: {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/ok.png", get(|| async { vec![1u8, 2, 3, 4] }))
            .route(
                "/gone.png",
                get(|| async { (AxumStatus::NOT_FOUND, "gone") }),
            )
            .route(
                "/empty.png",
                get(|| async { AxumStatus::NO_CONTENT }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn downloads_whole_body() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        let bytes = download_bytes(&client, &format!("{base}/ok.png")).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();
        for path in ["/gone.png", "/empty.png"] {
            let err = download_bytes(&client, &format!("{base}{path}"))
                .await
                .unwrap_err();
            assert!(matches!(err, GenerationError::Download(_)), "{path}: {err}");
        }
    }

    #[tokio::test]
    async fn rejects_other_schemes() {
        let client = reqwest::Client::new();
        let err = download_bytes(&client, "file:///etc/passwd").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme"));
        assert!(download_bytes(&client, "not a url").await.is_err());
    }
}
