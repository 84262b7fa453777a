//! Extension configuration (config.toml)
//!
//! ```toml
//! namespace = "stub"
//! name = "stub"
//! backend = "ZendEngine3"
//!
//! [extra]
//! export-classes = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::backend::BackendKind;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Extension-wide settings consulted during emission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionConfig {
    /// Root namespace of the extension; prefixes every native symbol
    pub namespace: String,

    /// Extension name (defaults to the namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target ABI generation
    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub extra: ExtraConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ExtraConfig {
    /// Declare class entries with `ZEPHIR_API` so other extensions can link them
    #[serde(default)]
    pub export_classes: bool,
}

impl ExtensionConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: None,
            backend: BackendKind::default(),
            extra: ExtraConfig::default(),
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_export_classes(mut self, export: bool) -> Self {
        self.extra.export_classes = export;
        self
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExtensionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::ValidationError(
                "Extension namespace cannot be empty".to_string(),
            ));
        }
        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\')
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid namespace: {}. Must contain only alphanumeric characters, underscores and namespace separators",
                self.namespace
            )));
        }
        Ok(())
    }

    pub fn extension_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.namespace.to_lowercase())
    }

    /// Namespace as used inside native symbols
    pub fn c_namespace(&self) -> String {
        zext_model::naming::c_namespace(&self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ExtensionConfig::from_str(
            r#"
namespace = "stub"
name = "stub_ext"
backend = "ZendEngine2"

[extra]
export-classes = true
"#,
        )
        .unwrap();

        assert_eq!(config.namespace, "stub");
        assert_eq!(config.extension_name(), "stub_ext");
        assert_eq!(config.backend, BackendKind::ZendEngine2);
        assert!(config.extra.export_classes);
    }

    #[test]
    fn test_defaults() {
        let config = ExtensionConfig::from_str(r#"namespace = "Stub""#).unwrap();
        assert_eq!(config.backend, BackendKind::ZendEngine3);
        assert!(!config.extra.export_classes);
        assert_eq!(config.extension_name(), "stub");
    }

    #[test]
    fn test_empty_namespace_is_rejected() {
        let err = ExtensionConfig::from_str(r#"namespace = """#).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_backend_is_a_parse_error() {
        let err = ExtensionConfig::from_str(
            r#"
namespace = "stub"
backend = "ZendEngine9"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_namespace() {
        assert!(ExtensionConfig::from_str("name = \"x\"").is_err());
    }
}
