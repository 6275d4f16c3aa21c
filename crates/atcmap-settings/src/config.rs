//! Configuration and settings management for ATCMap
//!
//! Two documents are read:
//! - the translator's own settings (enable flag, manual pocket mappings,
//!   comment annotation label), owned by this plugin
//! - the host machine configuration, of which only the magazine capacity
//!   (`tool.count`) is consumed
//!
//! Settings files may be JSON or TOML.

use crate::error::{SettingsError, SettingsResult};
use atcmap_core::ManualMappings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Magazine capacity used when the host configuration does not say
pub const DEFAULT_MAGAZINE_CAPACITY: u32 = 8;

fn default_enable_translation() -> bool {
    true
}

fn default_annotation_label() -> String {
    "Fusion".to_string()
}

/// Plugin-scoped translator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorSettings {
    /// Translate tool numbers when a program is loaded
    #[serde(
        default = "default_enable_translation",
        alias = "enableToolNumberTranslation"
    )]
    pub enable_translation: bool,
    /// Source name written into annotated comments
    #[serde(default = "default_annotation_label")]
    pub annotation_label: String,
    /// Operator overrides keyed by tool identifier
    #[serde(default)]
    pub manual_tool_mappings: ManualMappings,
    /// Settings owned by other features of the plugin
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            enable_translation: default_enable_translation(),
            annotation_label: default_annotation_label(),
            manual_tool_mappings: ManualMappings::new(),
            extra: Map::new(),
        }
    }
}

impl TranslatorSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let settings: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        if self.annotation_label.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "annotationLabel".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Tool changer section of the host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChangerConfig {
    /// Number of pockets in the magazine
    #[serde(default)]
    pub count: Option<u32>,
}

/// Host machine configuration (only the parts the translator reads)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Tool changer settings
    #[serde(default)]
    pub tool: ToolChangerConfig,
}

impl MachineConfig {
    /// Configuration with an explicit magazine size
    pub fn with_magazine_capacity(count: u32) -> Self {
        Self {
            tool: ToolChangerConfig { count: Some(count) },
        }
    }

    /// Magazine capacity, falling back to [`DEFAULT_MAGAZINE_CAPACITY`]
    pub fn magazine_capacity(&self) -> u32 {
        match self.tool.count {
            Some(count) if count > 0 => count,
            _ => DEFAULT_MAGAZINE_CAPACITY,
        }
    }
}
