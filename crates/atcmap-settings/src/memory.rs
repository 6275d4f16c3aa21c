//! In-memory store
//!
//! Used by embedders that keep their own state and by tests. Reads and
//! writes can be made to fail on demand, and every successful write is
//! counted.

use crate::config::{MachineConfig, TranslatorSettings};
use crate::error::{SettingsError, SettingsResult};
use crate::store::Store;
use async_trait::async_trait;
use atcmap_core::ToolRecord;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    tools: Vec<ToolRecord>,
    settings: TranslatorSettings,
    machine: MachineConfig,
    fail_reads: bool,
    fail_writes: bool,
    tool_writes: usize,
    settings_writes: usize,
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: initial tool records
    pub fn with_tools(self, tools: Vec<ToolRecord>) -> Self {
        self.inner.lock().tools = tools;
        self
    }

    /// Builder: initial settings
    pub fn with_settings(self, settings: TranslatorSettings) -> Self {
        self.inner.lock().settings = settings;
        self
    }

    /// Builder: magazine capacity
    pub fn with_magazine_capacity(self, count: u32) -> Self {
        self.inner.lock().machine = MachineConfig::with_magazine_capacity(count);
        self
    }

    /// Make every read fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Make every write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Replace tools without counting a write (an edit made by someone else)
    pub fn replace_tools_externally(&self, tools: Vec<ToolRecord>) {
        self.inner.lock().tools = tools;
    }

    /// Replace settings without counting a write
    pub fn replace_settings_externally(&self, settings: TranslatorSettings) {
        self.inner.lock().settings = settings;
    }

    /// Snapshot of the stored tools
    pub fn tools(&self) -> Vec<ToolRecord> {
        self.inner.lock().tools.clone()
    }

    /// Snapshot of the stored settings
    pub fn settings(&self) -> TranslatorSettings {
        self.inner.lock().settings.clone()
    }

    /// Number of successful tool collection writes
    pub fn tool_writes(&self) -> usize {
        self.inner.lock().tool_writes
    }

    /// Number of successful settings writes
    pub fn settings_writes(&self) -> usize {
        self.inner.lock().settings_writes
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_tools(&self) -> SettingsResult<Vec<ToolRecord>> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(SettingsError::LoadError("tool library".to_string()));
        }
        Ok(inner.tools.clone())
    }

    async fn save_tools(&self, tools: &[ToolRecord]) -> SettingsResult<()> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(SettingsError::SaveError("tool library".to_string()));
        }
        inner.tools = tools.to_vec();
        inner.tool_writes += 1;
        Ok(())
    }

    async fn load_settings(&self) -> SettingsResult<TranslatorSettings> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(SettingsError::LoadError("translator settings".to_string()));
        }
        Ok(inner.settings.clone())
    }

    async fn save_settings(&self, settings: &TranslatorSettings) -> SettingsResult<()> {
        settings.validate()?;
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(SettingsError::SaveError("translator settings".to_string()));
        }
        inner.settings = settings.clone();
        inner.settings_writes += 1;
        Ok(())
    }

    async fn load_machine_config(&self) -> SettingsResult<MachineConfig> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(SettingsError::LoadError("machine configuration".to_string()));
        }
        Ok(inner.machine.clone())
    }
}
