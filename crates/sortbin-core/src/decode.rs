//! Decoding of fetched image bytes with format sniffing, limits and timeout.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::ClassifyError;

/// Image decoder with configurable limits and timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory image on the blocking pool, bounded by the decode timeout.
    pub async fn decode(&self, bytes: Vec<u8>) -> Result<DecodedImage, ClassifyError> {
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_sync(bytes)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(ClassifyError::ImageTooLarge {
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(ClassifyError::Decode {
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(ClassifyError::Timeout {
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    pub fn decode_sync(bytes: Vec<u8>) -> Result<DecodedImage, ClassifyError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ClassifyError::Decode {
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format().ok_or_else(|| ClassifyError::Decode {
            message: "Unrecognized image format".to_string(),
        })?;
        let image = reader.decode().map_err(|e| ClassifyError::Decode {
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        tracing::debug!("Decoded {:?} image ({}x{})", format, width, height);
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}
