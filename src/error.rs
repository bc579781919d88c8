//! Error types for the s25fl tool

use s25fl_dummy::DummyError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Driver error on the emulated bus
pub type FlashError = s25fl_core::Error<DummyError>;

/// Errors reported by the command-line tool
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The settings file could not be parsed
    #[error("Invalid settings file '{path}': {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The driver reported an error
    #[error("Flash error: {0}")]
    Flash(#[from] FlashError),

    /// The chip did not identify as an S25FL064L
    #[error("Unexpected device {manufacturer:#04x}/{device:#06x}, refusing to modify it")]
    UnexpectedDevice { manufacturer: u8, device: u16 },

    /// The image file does not fit the chip
    #[error("Image is {len} bytes but the chip holds {size} bytes")]
    ImageTooLarge { len: usize, size: usize },

    /// A requested range extends past the end of the chip
    #[error("Range {start:#x}+{len:#x} exceeds flash size {size:#x}")]
    OutOfRange { start: u32, len: u64, size: u32 },

    /// Read-back after a write did not match
    #[error("Verification failed at {address:#x}: expected {expected:#04x}, found {found:#04x}")]
    VerifyFailed { address: u32, expected: u8, found: u8 },

    /// The chip flagged a program or erase failure
    #[error("Flash reported error status {0:?}")]
    ErrorStatus(s25fl_core::register::ErrorStatus),

    /// The self-test found a bad byte
    #[error("Memtest failed at sector {sector}, page {page}, byte {byte}: wrote {expected:#04x}, read {found:#04x}")]
    MemtestFault {
        sector: u32,
        page: u32,
        byte: usize,
        expected: u8,
        found: u8,
    },

    /// Progress bar template error
    #[error("Progress bar template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}

impl From<s25fl_core::memtest::Fault> for CliError {
    fn from(fault: s25fl_core::memtest::Fault) -> Self {
        Self::MemtestFault {
            sector: fault.sector,
            page: fault.page,
            byte: fault.byte,
            expected: fault.expected,
            found: fault.found,
        }
    }
}
