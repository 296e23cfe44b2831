//! Background removal via the remove.bg HTTP API
//!
//! Wraps the single outbound POST the bot performs. Failures never escape
//! this module: the caller sees `Some(bytes)` or `None`.

use crate::config::Settings;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, error, info};

/// MIME types accepted by remove.bg
pub const SUPPORTED_FORMATS: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/heic",
];

/// Internal error for a failed removal request. Logged, never propagated
/// past [`RemoveBgClient::remove_background`].
#[derive(Debug, Error)]
enum RemovalError {
    #[error("API error: {status} - {body}")]
    Api { status: StatusCode, body: String },
    #[error("Network error: {0}")]
    Network(String),
}

/// Client for the remove.bg background-removal API
pub struct RemoveBgClient {
    http_client: HttpClient,
    api_key: String,
    endpoint: String,
}

impl RemoveBgClient {
    /// Create a new client from application settings
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: settings.remove_bg_api_key.clone(),
            endpoint: settings.remove_bg_endpoint.clone(),
        }
    }

    /// Remove the background from `image`.
    ///
    /// Returns the processed image bytes verbatim on HTTP 2xx, or `None`
    /// on any transport failure or non-success status. No retries.
    pub async fn remove_background(&self, image: Vec<u8>) -> Option<Bytes> {
        match self.request(image).await {
            Ok(body) => {
                info!(bytes = body.len(), "Received processed image from remove.bg");
                Some(body)
            }
            Err(e) => {
                error!("remove.bg request failed: {e}");
                None
            }
        }
    }

    async fn request(&self, image: Vec<u8>) -> Result<Bytes, RemovalError> {
        debug!(bytes = image.len(), "Sending request to remove.bg");

        let form = Form::new()
            .part("image_file", Part::bytes(image).file_name("image"))
            .text("size", "auto");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RemovalError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Truncate very long error bodies before they reach the logs,
            // backing off to a char boundary so multi-byte text can't panic
            let body = if body.len() > 500 {
                let mut end = 500;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}... (truncated)", &body[..end])
            } else {
                body
            };
            return Err(RemovalError::Api { status, body });
        }

        response
            .bytes()
            .await
            .map_err(|e| RemovalError::Network(e.to_string()))
    }
}

/// Case-insensitive membership test against [`SUPPORTED_FORMATS`].
#[must_use]
pub fn is_supported_format(mime_type: &str) -> bool {
    let is_valid = SUPPORTED_FORMATS.contains(&mime_type.to_ascii_lowercase().as_str());
    debug!(mime_type, is_valid, "Image format validation");
    is_valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats_accepted() {
        for mime in SUPPORTED_FORMATS {
            assert!(is_supported_format(mime), "rejected {mime}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_supported_format("IMAGE/JPEG"));
        assert!(is_supported_format("Image/Png"));
        assert!(is_supported_format("image/HEIC"));
    }

    #[test]
    fn test_unsupported_formats_rejected() {
        assert!(!is_supported_format("image/bmp"));
        assert!(!is_supported_format("image/gif"));
        assert!(!is_supported_format("image/tiff"));
        assert!(!is_supported_format("application/pdf"));
        assert!(!is_supported_format("jpeg"));
        assert!(!is_supported_format(""));
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(is_supported_format("image/webp"), is_supported_format("image/webp"));
        assert_eq!(is_supported_format("image/bmp"), is_supported_format("image/bmp"));
    }
}
