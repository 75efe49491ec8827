//! Configuration management for sortbin.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Secrets are referenced as `${ENV_VAR}` and resolved at startup.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `server.port`.
pub const PORT_ENV: &str = "PORT";

/// Root configuration structure for sortbin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Image host settings
    pub relay: RelayConfig,

    /// CLIP model settings
    pub model: ModelConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Taxonomy source
    pub taxonomy: TaxonomyConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist. The `PORT`
    /// environment variable is applied on top in both cases.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_or_default(&Self::default_path())?;
        config.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise. No environment overrides.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.sortbin.sortbin/config.toml
    /// - Linux: ~/.config/sortbin/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sortbin\config\config.toml
    ///
    /// Falls back to ~/.sortbin/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sortbin", "sortbin")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sortbin").join("config.toml")
            })
    }

    /// Apply a `PORT` value on top of the file configuration.
    ///
    /// An unset or blank value leaves `server.port` untouched; anything that
    /// is not a valid non-zero port is rejected.
    pub fn apply_port_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        let port: u16 = raw.parse().map_err(|_| {
            ConfigError::ValidationError(format!("{PORT_ENV}={raw:?} is not a valid port"))
        })?;
        if port == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{PORT_ENV} must be > 0"
            )));
        }
        self.server.port = port;
        Ok(())
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.model.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Directory holding the configured model's ONNX files and tokenizer.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join(&self.model.model)
    }

    /// Resolved path of a custom taxonomy file, if one is configured.
    pub fn taxonomy_path(&self) -> Option<PathBuf> {
        self.taxonomy
            .path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }

    /// Resolve the image host API key.
    ///
    /// Fails when the key is empty or references an unset variable; the
    /// server refuses to start without it.
    pub fn relay_api_key(&self) -> Result<String, ConfigError> {
        resolve_env_var(&self.relay.api_key).ok_or_else(|| ConfigError::MissingSecret {
            name: "image host API key".to_string(),
            env: env_var_name(&self.relay.api_key)
                .unwrap_or("IMGBB_API_KEY")
                .to_string(),
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if let Some(var_name) = env_var_name(value) {
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn env_var_name(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|v| v.strip_suffix('}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.image_size, 224);
        assert_eq!(config.relay.api_key, "${IMGBB_API_KEY}");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[relay]"));
        assert!(toml.contains("[model]"));
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_mb, 32);
        assert_eq!(config.model.model, "clip-vit-large-patch14");
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_port_override() {
        let mut config = Config::default();
        config.apply_port_override(Some("10000")).unwrap();
        assert_eq!(config.server.port, 10000);
    }

    #[test]
    fn test_port_override_unset_or_blank_keeps_default() {
        let mut config = Config::default();
        config.apply_port_override(None).unwrap();
        config.apply_port_override(Some("  ")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_port_override_rejects_garbage() {
        let mut config = Config::default();
        assert!(config.apply_port_override(Some("http")).is_err());
        assert!(config.apply_port_override(Some("0")).is_err());
        assert!(config.apply_port_override(Some("70000")).is_err());
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_bad_port_override_keeps_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8080\n\n[taxonomy]\npath = \"/srv/my_taxonomy.toml\"\n",
        )
        .unwrap();

        let mut config = Config::load_or_default(&path).unwrap();
        let err = config.apply_port_override(Some("5000abc")).unwrap_err();
        assert!(err.to_string().contains("5000abc"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.taxonomy_path(),
            Some(PathBuf::from("/srv/my_taxonomy.toml"))
        );
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_resolve_literal_value() {
        assert_eq!(resolve_env_var("abc123"), Some("abc123".to_string()));
        assert_eq!(resolve_env_var(""), None);
    }

    #[test]
    fn test_relay_api_key_missing_names_variable() {
        let mut config = Config::default();
        config.relay.api_key = "${SORTBIN_TEST_KEY_THAT_IS_NEVER_SET}".to_string();
        let err = config.relay_api_key().unwrap_err();
        assert!(err
            .to_string()
            .contains("SORTBIN_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_relay_api_key_literal() {
        let mut config = Config::default();
        config.relay.api_key = "literal-key".to_string();
        assert_eq!(config.relay_api_key().unwrap(), "literal-key");
    }

    #[test]
    fn test_model_path_joins_model_name() {
        let mut config = Config::default();
        config.model.model_dir = PathBuf::from("/opt/models");
        assert_eq!(
            config.model_path(),
            PathBuf::from("/opt/models/clip-vit-large-patch14")
        );
    }
}
