//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "s25fl")]
#[command(author, version, about = "S25FL064L flash driver tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Image file backing the emulated chip
    /// Created 0xFF-filled if missing, saved back after write and erase
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// Settings file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show chip identification and configuration
    Info,

    /// Read flash contents to file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (defaults to the rest of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Write file to flash
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Don't erase the covered sectors before writing
        #[arg(long)]
        no_erase: bool,

        /// Don't read back and compare after writing
        #[arg(long)]
        no_verify: bool,
    },

    /// Erase flash sectors or the whole chip
    Erase {
        /// Erase the whole chip
        #[arg(long, conflicts_with_all = ["start", "length"])]
        chip: bool,

        /// Start address of the region to erase (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Length of region to erase (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, required_unless_present = "chip")]
        length: Option<u32>,
    },

    /// Erase, program and verify a range of sectors
    Memtest {
        /// First sector to test
        #[arg(long, default_value_t = 0)]
        first: u32,

        /// Number of sectors to test
        #[arg(long, default_value_t = 16)]
        sectors: u32,
    },

    /// Show status registers, then read and clear the error flags
    Status,
}

impl Commands {
    /// Whether the command changes flash contents
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Write { .. } | Self::Erase { .. } | Self::Memtest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("0XFF"), Ok(0xFF));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_erase_requires_length_or_chip() {
        assert!(Cli::try_parse_from(["s25fl", "erase"]).is_err());
        assert!(Cli::try_parse_from(["s25fl", "erase", "--chip"]).is_ok());
        assert!(Cli::try_parse_from(["s25fl", "erase", "--length", "0x1000"]).is_ok());
        assert!(Cli::try_parse_from(["s25fl", "erase", "--chip", "--length", "1"]).is_err());
    }
}
