//! Client for the OpenAI-compatible `images/edits` endpoint.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::constants::IMAGE_SIZE;
use crate::error::GenerationError;
use crate::styles::{ImageRole, Quality};

/// An uploaded photo, tagged with the role it plays in the prompt.
#[derive(Clone, Debug)]
pub struct InputImage {
    /// Which photo this is
    pub role: ImageRole,
    /// The bytes exactly as uploaded
    pub bytes: Vec<u8>,
}

/// The two shapes an image API answer can take.
#[derive(Debug, Eq, PartialEq)]
pub enum RawGenerationResponse {
    /// The image came back inline, already decoded from base64
    Inline(Vec<u8>),
    /// The image must be fetched from a temporary URL
    Remote(String),
}

#[derive(Deserialize, Debug)]
struct ImagesEditResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// Talks to the image API.
#[derive(Clone, Debug)]
pub struct ImageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ImageClient {
    /// Builds a client with the configured timeout.
    pub fn new(config: &ApiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GenerationError::Upstream(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The underlying HTTP client, shared with result downloads.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends the prompt and PNG-encoded images to the API and returns
    /// whichever response shape came back.
    pub async fn invoke_generation(
        &self,
        prompt: &str,
        images: &[InputImage],
        quality: Quality,
        model: &str,
    ) -> Result<RawGenerationResponse, GenerationError> {
        let mut form = Form::new()
            .text("model", model.to_string())
            .text("prompt", prompt.to_string())
            .text("quality", quality.as_str())
            .text("size", IMAGE_SIZE)
            .text("n", "1");
        for image in images {
            let part = Part::bytes(image.bytes.clone())
                .file_name(format!("{}.png", image.role))
                .mime_str("image/png")
                .map_err(|err| GenerationError::Upstream(err.to_string()))?;
            form = form.part("image[]", part);
        }

        let url = format!("{}/images/edits", self.base_url);
        info!("Sending {} image(s) to {} (model: {model}, quality: {quality})", images.len(), url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| GenerationError::Upstream(format!("Request to {url} failed: {err}")))?;

        let status = resp.status();
        let resp_bytes = resp
            .bytes()
            .await
            .map_err(|err| GenerationError::Upstream(format!("Failed reading response body: {err}")))?;
        if !status.is_success() {
            return Err(GenerationError::Upstream(format!(
                "Image API error {status}: {}",
                String::from_utf8_lossy(&resp_bytes)
            )));
        }

        parse_response(&resp_bytes)
    }
}

/// Probes an API answer for inline data first, then for a URL.
pub fn parse_response(body: &[u8]) -> Result<RawGenerationResponse, GenerationError> {
    let parsed: ImagesEditResponse = serde_json::from_slice(body)
        .map_err(|err| GenerationError::Upstream(format!("Failed to parse response JSON: {err}")))?;

    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Upstream("No image data returned".to_string()))?;

    if let Some(revised_prompt) = first.revised_prompt {
        debug!("Revised prompt from the image API: {revised_prompt}");
    }

    if let Some(b64_json) = first.b64_json.filter(|value| !value.is_empty()) {
        let bytes = general_purpose::STANDARD
            .decode(b64_json)
            .map_err(|err| GenerationError::Upstream(format!("Failed to base64-decode image: {err}")))?;
        Ok(RawGenerationResponse::Inline(bytes))
    } else if let Some(url) = first.url.filter(|value| !value.is_empty()) {
        Ok(RawGenerationResponse::Remote(url))
    } else {
        Err(GenerationError::Upstream(
            "Image response missing b64_json and url fields".to_string(),
        ))
    }
}

/// Ensures image bytes are a valid PNG, converting if possible.
pub fn normalize_image_to_png(bytes: &[u8]) -> Result<Vec<u8>, GenerationError> {
    if bytes.len() < 4 {
        debug!("Image is too short");
        return Err(GenerationError::InvalidImage("image is too short".to_string()));
    }

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| {
            debug!("Failed to guess image format: {}", err);
            GenerationError::InvalidImage(err.to_string())
        })?;
    let format = reader.format();
    let image = reader.decode().map_err(|err| {
        debug!("Failed to decode image: {}", err);
        GenerationError::InvalidImage(err.to_string())
    })?;

    if format == Some(image::ImageFormat::Png) {
        return Ok(bytes.to_vec());
    }

    let mut output = Cursor::new(Vec::new());
    image
        .write_to(&mut output, image::ImageFormat::Png)
        .map_err(|err| GenerationError::InvalidImage(err.to_string()))?;
    Ok(output.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_image;

    #[test]
    fn inline_payload_is_decoded() {
        let encoded = general_purpose::STANDARD.encode([9u8, 8, 7]);
        let body = format!(r#"{{"data":[{{"b64_json":"{encoded}"}}]}}"#);
        assert_eq!(
            parse_response(body.as_bytes()).unwrap(),
            RawGenerationResponse::Inline(vec![9, 8, 7])
        );
    }

    #[test]
    fn url_payload_is_passed_through() {
        let body = br#"{"data":[{"url":"https://cdn.example.org/tmp/a.png","revised_prompt":"x"}]}"#;
        assert_eq!(
            parse_response(body).unwrap(),
            RawGenerationResponse::Remote("https://cdn.example.org/tmp/a.png".to_string())
        );
    }

    #[test]
    fn inline_wins_when_both_are_present() {
        let encoded = general_purpose::STANDARD.encode([1u8]);
        let body = format!(r#"{{"data":[{{"b64_json":"{encoded}","url":"http://x/y.png"}}]}}"#);
        assert!(matches!(
            parse_response(body.as_bytes()).unwrap(),
            RawGenerationResponse::Inline(_)
        ));
    }

    #[test]
    fn malformed_answers_are_upstream_errors() {
        let bodies: [&[u8]; 5] = [
            b"not json",
            br#"{"data":[]}"#,
            br#"{"data":[{}]}"#,
            br#"{"data":[{"b64_json":"!!!"}]}"#,
            br#"{"error":{"message":"bad"}}"#,
        ];
        for body in bodies {
            assert!(matches!(
                parse_response(body),
                Err(GenerationError::Upstream(_))
            ));
        }
    }

    #[test]
    fn test_normalize_image_to_png() {
        let png = sample_image(image::ImageFormat::Png);
        assert_eq!(normalize_image_to_png(&png).unwrap(), png);

        let jpeg = sample_image(image::ImageFormat::Jpeg);
        let converted = normalize_image_to_png(&jpeg).unwrap();
        assert_eq!(
            image::guess_format(&converted).unwrap(),
            image::ImageFormat::Png
        );

        assert!(normalize_image_to_png(&[]).is_err());
        assert!(normalize_image_to_png(&[0x89, 0x50, 0x4E, 0x47, 0x00]).is_err());
        assert!(normalize_image_to_png(b"This is not an image file.").is_err());
    }
}
