use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ImageError, Result};

/// Registry that locally created images are qualified with.
pub const DEFAULT_LOCAL_REGISTRY: &str = "localhost";

/// Image management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Registry prepended to unqualified names of locally created images
    pub default_local_registry: String,

    /// How tags take part in repotag matching
    pub tag_matching: TagMatching,

    /// Directory holding the local image index
    pub store_dir: PathBuf,

    /// Signature policy file (falls back to the system policy)
    pub signature_policy_path: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_local_registry: DEFAULT_LOCAL_REGISTRY.to_string(),
            tag_matching: TagMatching::default(),
            store_dir: default_store_dir(),
            signature_policy_path: None,
            log_level: LogLevel::Warn,
        }
    }
}

impl ImageConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path).map_err(|e| {
            ImageError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ImageConfig = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let registry = self.default_local_registry.as_str();
        if registry.is_empty() {
            return Err(ImageError::Config(
                "default_local_registry must not be empty".to_string(),
            ));
        }
        if registry.contains('/') {
            return Err(ImageError::Config(format!(
                "default_local_registry \"{registry}\" must be a bare host without '/'"
            )));
        }
        Ok(())
    }
}

/// Return the default image store directory (~/.repotag/images).
pub fn default_store_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".repotag"))
        .unwrap_or_else(|| PathBuf::from(".repotag"))
        .join("images")
}

/// Return the default config file path (~/.repotag/config.yaml).
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".repotag"))
        .unwrap_or_else(|| PathBuf::from(".repotag"))
        .join("config.yaml")
}

/// Tag participation in repotag matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatching {
    /// Only the suspicious-tag class has to agree
    #[default]
    Class,
    /// The effective tag has to be identical as well
    Exact,
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl LogLevel {
    /// Directive string accepted by an env filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ImageConfig::default();
        assert_eq!(config.default_local_registry, "localhost");
        assert_eq!(config.tag_matching, TagMatching::Class);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.signature_policy_path.is_none());
        assert!(config.store_dir.ends_with("images"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ImageConfig::load(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(config.default_local_registry, "localhost");
    }

    #[test]
    fn test_load_partial_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(
            &path,
            "default_local_registry: registry.local:5000\ntag_matching: exact\nlog_level: debug\n",
        )
        .unwrap();

        let config = ImageConfig::load(&path).unwrap();
        assert_eq!(config.default_local_registry, "registry.local:5000");
        assert_eq!(config.tag_matching, TagMatching::Exact);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.store_dir.ends_with("images"));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "tag_matching: sometimes\n").unwrap();
        assert!(matches!(
            ImageConfig::load(&path),
            Err(ImageError::Serialization(_))
        ));
    }

    #[test]
    fn test_validate_rejects_path_registry() {
        let config = ImageConfig {
            default_local_registry: "localhost/ns".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ImageError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_registry() {
        let config = ImageConfig {
            default_local_registry: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
        assert_eq!(LogLevel::Info.as_str(), "info");
    }
}
