//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Upper bound for `server.max_upload_mb`.
const MAX_UPLOAD_MB: u64 = 1024;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if self.server.max_upload_mb == 0 || self.server.max_upload_mb > MAX_UPLOAD_MB {
            return Err(ConfigError::ValidationError(format!(
                "server.max_upload_mb must be between 1 and {MAX_UPLOAD_MB}"
            )));
        }
        if self.relay.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.endpoint must not be empty".into(),
            ));
        }
        if self.relay.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "relay.timeout_ms must be > 0".into(),
            ));
        }
        if self.model.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.image_size must be > 0".into(),
            ));
        }
        if self.model.text_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.text_batch_size must be > 0".into(),
            ));
        }
        if !(self.model.logit_scale.is_finite() && self.model.logit_scale > 0.0) {
            return Err(ConfigError::ValidationError(
                "model.logit_scale must be a positive number".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.server.max_upload_mb = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_upload_mb"));
    }

    #[test]
    fn test_validate_rejects_huge_upload_limit() {
        let mut config = Config::default();
        config.server.max_upload_mb = MAX_UPLOAD_MB;
        assert!(config.validate().is_ok());

        config.server.max_upload_mb = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_upload_mb"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.relay.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relay.timeout_ms"));

        let mut config = Config::default();
        config.limits.decode_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("decode_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_bad_logit_scale() {
        let mut config = Config::default();
        config.model.logit_scale = 0.0;
        assert!(config.validate().is_err());

        config.model.logit_scale = f32::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logit_scale"));
    }

    #[test]
    fn test_validate_rejects_blank_endpoint() {
        let mut config = Config::default();
        config.relay.endpoint = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relay.endpoint"));
    }
}
