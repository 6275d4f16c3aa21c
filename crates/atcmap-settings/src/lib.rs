//! ATCMap Settings Crate
//!
//! Handles plugin settings, host machine configuration, and persistence of
//! the tool library behind an injectable [`Store`].

pub mod config;
pub mod error;
pub mod file_store;
pub mod memory;
pub mod store;

pub use config::{MachineConfig, ToolChangerConfig, TranslatorSettings, DEFAULT_MAGAZINE_CAPACITY};
pub use error::{SettingsError, SettingsResult};
pub use file_store::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{
    load_library_or_default, load_settings_or_default, magazine_capacity_or_default, Store,
};
