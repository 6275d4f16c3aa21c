//! Store interface
//!
//! The translator never touches the filesystem or network directly. Every
//! read and write of externally owned state goes through a [`Store`] that the
//! caller injects. Reads are always fresh: nothing here caches between calls.

use crate::config::{MachineConfig, TranslatorSettings, DEFAULT_MAGAZINE_CAPACITY};
use crate::error::SettingsResult;
use async_trait::async_trait;
use atcmap_core::{ToolLibrary, ToolRecord};
use std::sync::Arc;

/// Persistence for the tool library, translator settings, and host config
#[async_trait]
pub trait Store: Send + Sync {
    /// Read every tool record, in persisted order
    async fn load_tools(&self) -> SettingsResult<Vec<ToolRecord>>;

    /// Replace the whole tool collection in one write
    async fn save_tools(&self, tools: &[ToolRecord]) -> SettingsResult<()>;

    /// Read the translator settings
    async fn load_settings(&self) -> SettingsResult<TranslatorSettings>;

    /// Replace the translator settings
    async fn save_settings(&self, settings: &TranslatorSettings) -> SettingsResult<()>;

    /// Read the host machine configuration
    async fn load_machine_config(&self) -> SettingsResult<MachineConfig>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn load_tools(&self) -> SettingsResult<Vec<ToolRecord>> {
        (**self).load_tools().await
    }

    async fn save_tools(&self, tools: &[ToolRecord]) -> SettingsResult<()> {
        (**self).save_tools(tools).await
    }

    async fn load_settings(&self) -> SettingsResult<TranslatorSettings> {
        (**self).load_settings().await
    }

    async fn save_settings(&self, settings: &TranslatorSettings) -> SettingsResult<()> {
        (**self).save_settings(settings).await
    }

    async fn load_machine_config(&self) -> SettingsResult<MachineConfig> {
        (**self).load_machine_config().await
    }
}

/// Load the tool library, falling back to an empty library on failure
pub async fn load_library_or_default<S: Store + ?Sized>(store: &S) -> ToolLibrary {
    match store.load_tools().await {
        Ok(records) => {
            tracing::debug!("Loaded {} tool(s) from library", records.len());
            ToolLibrary::from_records(records)
        }
        Err(e) => {
            tracing::warn!("Error loading tool library, continuing with none: {}", e);
            ToolLibrary::new()
        }
    }
}

/// Load translator settings, falling back to defaults on failure
pub async fn load_settings_or_default<S: Store + ?Sized>(store: &S) -> TranslatorSettings {
    match store.load_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Error loading translator settings, using defaults: {}", e);
            TranslatorSettings::default()
        }
    }
}

/// Magazine capacity, falling back to [`DEFAULT_MAGAZINE_CAPACITY`] on failure
pub async fn magazine_capacity_or_default<S: Store + ?Sized>(store: &S) -> u32 {
    match store.load_machine_config().await {
        Ok(config) => config.magazine_capacity(),
        Err(e) => {
            tracing::warn!(
                "Error loading magazine size, using {}: {}",
                DEFAULT_MAGAZINE_CAPACITY,
                e
            );
            DEFAULT_MAGAZINE_CAPACITY
        }
    }
}
