//! Materializer configuration
//!
//! The defaults match what the documentation theme emits and what the
//! client-side diagram library looks for. A JSON file can override any
//! subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DiagramError;

/// Names used to recognize source blocks and to build containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    /// Class token the markdown renderer puts on fenced diagram blocks
    pub primary_marker: String,
    /// Older spelling of the same tag, still found in existing pages
    pub legacy_marker: String,
    /// Element name of the container that replaces a source block
    pub container_tag: String,
    /// Class the diagram library scans for
    pub container_class: String,
    /// Prefix for ids assigned to rendered containers
    pub id_prefix: String,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            primary_marker: "language-mermaid".to_string(),
            legacy_marker: "lang-mermaid".to_string(),
            container_tag: "div".to_string(),
            container_class: "mermaid".to_string(),
            id_prefix: "mermaid".to_string(),
        }
    }
}

impl MaterializerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, DiagramError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DiagramError::config_error(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiagramError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| match e {
            DiagramError::ConfigError { message } => {
                DiagramError::config_error(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    fn validate(&self) -> Result<(), DiagramError> {
        let fields = [
            ("primary_marker", &self.primary_marker),
            ("legacy_marker", &self.legacy_marker),
            ("container_tag", &self.container_tag),
            ("container_class", &self.container_class),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(DiagramError::config_error(format!("{} must not be empty", name)));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(DiagramError::config_error(format!(
                    "{} must be a single token, got {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
