//! Settings file
//!
//! An optional TOML file tunes the emulated chip and the driver:
//!
//! ```toml
//! [emulator]
//! busy_polls = 4
//! max_transfer_len = 255
//!
//! [driver.busy]
//! max_polls = 100000
//! ```

use crate::error::CliError;
use s25fl_core::device::Config;
use s25fl_dummy::DummyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Emulated chip settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorSettings {
    /// Status polls that report busy after each program or erase
    pub busy_polls: u32,
    /// Longest single bus transfer
    pub max_transfer_len: usize,
    /// Refuse to set the write enable latch
    pub write_protect: bool,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        let config = DummyConfig::default();
        Self {
            busy_polls: config.busy_polls,
            max_transfer_len: config.max_transfer_len,
            write_protect: config.write_protect,
        }
    }
}

/// Contents of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Emulated chip
    pub emulator: EmulatorSettings,
    /// Driver configuration
    pub driver: Config,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| CliError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from TOML text
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Emulator configuration for these settings
    pub fn dummy_config(&self) -> DummyConfig {
        DummyConfig {
            busy_polls: self.emulator.busy_polls,
            max_transfer_len: self.emulator.max_transfer_len,
            write_protect: self.emulator.write_protect,
            ..DummyConfig::default()
        }
    }
}
