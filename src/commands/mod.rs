//! CLI command implementations
//!
//! Every command runs against an initialized [`Flash`] handle on the
//! emulated bus and reports failures as [`CliError`].

mod erase;
mod info;
mod memtest;
mod read;
mod status;
mod write;

pub use erase::run_erase;
pub use info::run_info;
pub use memtest::run_memtest;
pub use read::run_read;
pub use status::run_status;
pub use write::run_write;

use crate::error::CliError;
use indicatif::{ProgressBar, ProgressStyle};
use s25fl_core::device::S25fl064l;
use s25fl_dummy::DummyFlash;

/// Device handle the commands operate on
pub type Flash<'a> = S25fl064l<'a, DummyFlash>;

/// Byte progress bar in the house style
fn byte_progress(len: u64) -> Result<ProgressBar, CliError> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Item progress bar (sectors)
fn item_progress(len: u64, unit: &str) -> Result<ProgressBar, CliError> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
                unit
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Check that `start..start + len` lies on the chip
fn check_range(flash: &Flash<'_>, start: u32, len: u64) -> Result<(), CliError> {
    let size = flash.size();
    if start as u64 + len > size as u64 {
        return Err(CliError::OutOfRange { start, len, size });
    }
    Ok(())
}

/// Refuse to modify a chip that is not an S25FL064L
pub fn check_identity(flash: &Flash<'_>, mutates: bool) -> Result<(), CliError> {
    if mutates && !flash.verify_identity() {
        return Err(CliError::UnexpectedDevice {
            manufacturer: flash.manufacturer_id(),
            device: flash.device_id(),
        });
    }
    Ok(())
}

/// Sectors overlapping `start..start + len`, as a range of sector indices
fn covered_sectors(flash: &Flash<'_>, start: u32, len: u32) -> std::ops::Range<u32> {
    if len == 0 {
        return 0..0;
    }
    let sector = flash.block_size();
    let first = start / sector;
    let last = (start + (len - 1)) / sector;
    first..last + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use s25fl_dummy::DummyConfig;

    #[test]
    fn test_covered_sectors() {
        let mut emulator = DummyFlash::new_default();
        let mut flash = S25fl064l::new(&mut emulator);
        flash.initialize().unwrap();

        assert_eq!(covered_sectors(&flash, 0x1234, 0), 0..0);
        assert_eq!(covered_sectors(&flash, 0x2000, 0x2000), 2..4);
        assert_eq!(covered_sectors(&flash, 0x2000, 0x1000), 2..3);
        assert_eq!(covered_sectors(&flash, 0x1F80, 0x100), 1..3);
        assert_eq!(covered_sectors(&flash, 0x1FFF, 1), 1..2);
    }

    #[test]
    fn test_foreign_chip_is_read_only() {
        let config = DummyConfig {
            device_id: 0x4017,
            ..Default::default()
        };
        let mut emulator = DummyFlash::new(config);
        let mut flash = S25fl064l::new(&mut emulator);
        flash.initialize().unwrap();

        assert!(check_identity(&flash, false).is_ok());
        assert!(matches!(
            check_identity(&flash, true),
            Err(CliError::UnexpectedDevice {
                manufacturer: 0x01,
                device: 0x4017
            })
        ));
    }

    #[test]
    fn test_own_chip_is_writable() {
        let mut emulator = DummyFlash::new_default();
        let mut flash = S25fl064l::new(&mut emulator);
        flash.initialize().unwrap();

        assert!(check_identity(&flash, true).is_ok());
    }
}
