//! Error types for sortbin.
//!
//! Errors are organized by collaborator (configuration, image relay, classifier)
//! so the request handler can map each class to the right user-visible outcome.

use thiserror::Error;

/// Top-level error type for sortbin operations.
#[derive(Error, Debug)]
pub enum SortbinError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image hosting errors
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    /// Classification errors
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required secret was not provided
    #[error("Missing {name}: set the {env} environment variable")]
    MissingSecret { name: String, env: String },

    /// The taxonomy table is malformed
    #[error("Invalid taxonomy: {0}")]
    Taxonomy(String),
}

/// Errors from the external image host.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The host answered with a non-success status
    #[error("Image host returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never completed (DNS, connect, timeout, body read)
    #[error("Request to image host failed: {0}")]
    Transport(String),

    /// The host answered 200 but the body was not usable
    #[error("Unexpected response from image host: {0}")]
    InvalidResponse(String),
}

/// Zero-shot classification errors.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Model loading or inference failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// The fetched image could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {width}x{height} > {max_dim}")]
    ImageTooLarge { width: u32, height: u32, max_dim: u32 },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// The score distribution and the label index are out of sync.
    ///
    /// Never recoverable: it means the classifier was handed a different
    /// label list than the one the index was built from.
    #[error("Score distribution has {actual} entries but the label index has {expected}")]
    ScoreLengthMismatch { expected: usize, actual: usize },
}

/// Convenience type alias for sortbin results.
pub type Result<T> = std::result::Result<T, SortbinError>;
