//! Directory-backed JSON store
//!
//! Layout of the data directory:
//! - `tools.json`: array of tool records
//! - `plugin-settings.json`: translator settings
//! - `settings.json`: host machine configuration (read only)
//!
//! A missing file reads as its default. Writes go to a temporary file in the
//! same directory which is then renamed over the target.

use crate::config::{MachineConfig, TranslatorSettings};
use crate::error::{SettingsError, SettingsResult};
use crate::store::Store;
use async_trait::async_trait;
use atcmap_core::ToolRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TOOLS_FILE: &str = "tools.json";
const PLUGIN_SETTINGS_FILE: &str = "plugin-settings.json";
const MACHINE_SETTINGS_FILE: &str = "settings.json";

/// Store reading and writing JSON documents in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the per-user configuration directory
    pub fn default_location() -> SettingsResult<Self> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::DataDirectory("no configuration directory found".to_string())
            })?;
        path.push("atcmap");
        Ok(Self::new(path))
    }

    /// Data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the tool library file
    pub fn tools_path(&self) -> PathBuf {
        self.root.join(TOOLS_FILE)
    }

    /// Path of the translator settings file
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(PLUGIN_SETTINGS_FILE)
    }

    /// Path of the host configuration file
    pub fn machine_config_path(&self) -> PathBuf {
        self.root.join(MACHINE_SETTINGS_FILE)
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> SettingsResult<Option<T>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SettingsError::Malformed {
                store: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> SettingsResult<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            SettingsError::DataDirectory(format!("{}: {}", self.root.display(), e))
        })?;

        let content = serde_json::to_string_pretty(value)?;
        let target = self.root.join(name);
        let temp = self.root.join(format!(".{}.tmp", name));
        tokio::fs::write(&temp, content).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        tracing::debug!("Wrote {}", target.display());
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load_tools(&self) -> SettingsResult<Vec<ToolRecord>> {
        Ok(Self::read_json(&self.tools_path()).await?.unwrap_or_default())
    }

    async fn save_tools(&self, tools: &[ToolRecord]) -> SettingsResult<()> {
        self.write_json(TOOLS_FILE, tools).await
    }

    async fn load_settings(&self) -> SettingsResult<TranslatorSettings> {
        let settings: TranslatorSettings = Self::read_json(&self.settings_path())
            .await?
            .unwrap_or_default();
        settings.validate()?;
        Ok(settings)
    }

    async fn save_settings(&self, settings: &TranslatorSettings) -> SettingsResult<()> {
        settings.validate()?;
        self.write_json(PLUGIN_SETTINGS_FILE, settings).await
    }

    async fn load_machine_config(&self) -> SettingsResult<MachineConfig> {
        Ok(Self::read_json(&self.machine_config_path())
            .await?
            .unwrap_or_default())
    }
}
