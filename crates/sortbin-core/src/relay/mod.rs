//! Image hosting relay.
//!
//! Uploads are forwarded to a third-party host that returns a public URL;
//! the classifier then works on the image fetched back from that URL, so
//! what users see is exactly what was classified.

pub mod imgbb;

use async_trait::async_trait;

use crate::error::RelayError;

pub use imgbb::ImgbbRelay;

/// An image stored on the external host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    /// Publicly fetchable URL
    pub url: String,
    /// Link that removes the image from the host, if the host provides one
    pub delete_url: Option<String>,
}

/// Trait that all image hosts implement.
///
/// Uses `async_trait` because the relay is shared as `Arc<dyn ImageRelay>`.
#[async_trait]
pub trait ImageRelay: Send + Sync {
    /// Host name for logging (e.g., "imgbb").
    fn name(&self) -> &str;

    /// Upload raw image bytes and return where they can be fetched.
    async fn upload(&self, bytes: &[u8], filename: Option<&str>)
        -> Result<HostedImage, RelayError>;

    /// Download a hosted image.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RelayError>;
}

/// Shorten a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str, max: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(truncate_body("  bad key \n", 20), "bad key");
    }

    #[test]
    fn test_truncate_body_long_respects_char_boundaries() {
        let body = "ñ".repeat(10);
        assert_eq!(truncate_body(&body, 3), "ñññ…");
    }
}
