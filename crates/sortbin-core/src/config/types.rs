//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Listening port (the `PORT` environment variable takes precedence)
    pub port: u16,

    /// Maximum accepted upload size in megabytes
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_mb: 32,
        }
    }
}

/// Image relay (imgbb) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Upload endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Per-request timeout for upload and fetch, in milliseconds
    pub timeout_ms: u64,

    /// Auto-delete hosted images after this many seconds (0 keeps them)
    pub expiration_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.imgbb.com/1/upload".to_string(),
            api_key: "${IMGBB_API_KEY}".to_string(),
            timeout_ms: 30000,
            expiration_secs: 0,
        }
    }
}

/// CLIP model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,

    /// Model name (subdirectory of `model_dir`)
    pub model: String,

    /// Square input size of the vision encoder
    pub image_size: u32,

    /// Multiplier applied to cosine similarities before the softmax.
    /// CLIP learns this as `exp(logit_scale)`, which saturates at 100.
    pub logit_scale: f32,

    /// Number of descriptors encoded per text-encoder call
    pub text_batch_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.sortbin/models"),
            model: "clip-vit-large-patch14".to_string(),
            image_size: 224,
            logit_scale: 100.0,
            text_batch_size: 64,
        }
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Taxonomy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Optional TOML file replacing the built-in taxonomy
    pub path: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
