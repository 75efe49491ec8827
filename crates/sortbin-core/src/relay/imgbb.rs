//! imgbb image host using the v1 upload API.
//!
//! Sends the image as a multipart `image` field with the API key; the JSON
//! response carries the public URL under `data.url`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{truncate_body, HostedImage, ImageRelay};
use crate::config::RelayConfig;
use crate::error::RelayError;

/// Longest slice of an error body kept in messages.
const ERROR_BODY_LIMIT: usize = 200;

/// imgbb relay.
pub struct ImgbbRelay {
    endpoint: String,
    api_key: String,
    expiration_secs: u64,
    client: reqwest::Client,
}

impl ImgbbRelay {
    pub fn new(config: &RelayConfig, api_key: &str) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RelayError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
            expiration_secs: config.expiration_secs,
            client,
        })
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
    #[serde(default)]
    success: bool,
}

#[derive(Deserialize)]
struct UploadData {
    url: Option<String>,
    delete_url: Option<String>,
}

/// Extract the hosted image from a successful upload response body.
fn parse_upload_response(body: &str) -> Result<HostedImage, RelayError> {
    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    if !parsed.success {
        return Err(RelayError::InvalidResponse(
            "Upload was not marked successful".to_string(),
        ));
    }

    let data = parsed
        .data
        .ok_or_else(|| RelayError::InvalidResponse("Response has no data".to_string()))?;
    let url = data
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| RelayError::InvalidResponse("Response has no image URL".to_string()))?;

    Ok(HostedImage {
        url,
        delete_url: data.delete_url,
    })
}

fn transport_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Transport(format!("timed out: {e}"))
    } else {
        RelayError::Transport(e.to_string())
    }
}

#[async_trait]
impl ImageRelay for ImgbbRelay {
    fn name(&self) -> &str {
        "imgbb"
    }

    async fn upload(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
    ) -> Result<HostedImage, RelayError> {
        let mut part = reqwest::multipart::Part::bytes(bytes.to_vec());
        if let Some(name) = filename {
            part = part.file_name(name.to_string());
        }
        let form = reqwest::multipart::Form::new()
            .text("key", self.api_key.clone())
            .part("image", part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if self.expiration_secs > 0 {
            request = request.query(&[("expiration", self.expiration_secs)]);
        }

        tracing::debug!("Uploading {} bytes to {}", bytes.len(), self.name());
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                message: truncate_body(&body, ERROR_BODY_LIMIT),
            });
        }

        let hosted = parse_upload_response(&body)?;
        tracing::info!("Uploaded image to {}", hosted.url);
        Ok(hosted)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RelayError> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Status {
                status: status.as_u16(),
                message: truncate_body(&body, ERROR_BODY_LIMIT),
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
