//! Info command implementation

use super::Flash;
use crate::error::CliError;
use s25fl_core::device::{DEVICE_ID, MANUFACTURER_ID, PAGE_SIZE};
use s25fl_core::sfdp::PARAM_ID_SECTOR_MAP;

/// Print identification, SFDP and configuration details
pub fn run_info(flash: &mut Flash<'_>) -> Result<(), CliError> {
    let status = flash.status()?;

    println!("Flash Chip Information");
    println!("======================");
    println!();
    println!(
        "JEDEC ID:        {:02X} {:04X}{}",
        flash.manufacturer_id(),
        flash.device_id(),
        if flash.verify_identity() {
            " (S25FL064L)"
        } else {
            " (unexpected)"
        }
    );
    if !flash.verify_identity() {
        log::warn!(
            "Expected JEDEC ID {:02X} {:04X}",
            MANUFACTURER_ID,
            DEVICE_ID
        );
    }

    let uid: Vec<String> = flash
        .unique_id()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect();
    println!("Unique ID:       {}", uid.join(""));

    let size = flash.size();
    println!(
        "Size:            {} bytes ({} KiB / {} MiB)",
        size,
        size / 1024,
        size / (1024 * 1024)
    );
    println!("Page size:       {} bytes", PAGE_SIZE);
    println!(
        "Sectors:         {} x {} bytes",
        flash.block_count(),
        flash.block_size()
    );

    match flash.flash_params() {
        Some(params) if params.is_valid() => {
            println!("SFDP:            Revision {}", params.header.revision);
            for param in &params.params {
                let name = if param.is_basic() {
                    "Basic Flash Parameters"
                } else if param.id == PARAM_ID_SECTOR_MAP {
                    "Sector Map"
                } else {
                    "Unknown"
                };
                println!(
                    "  {:<24} rev {}, {} bytes at 0x{:06X}",
                    name,
                    param.revision,
                    param.length_bytes(),
                    param.table_pointer
                );
            }
        }
        Some(params) => println!(
            "SFDP:            Invalid signature 0x{:08X}",
            params.header.signature
        ),
        None => println!("SFDP:            Not read"),
    }

    println!();
    println!(
        "Address mode:    {}-byte",
        flash.address_width().bytes()
    );
    println!(
        "QPI mode:        {}",
        if flash.qpi_mode() { "enabled" } else { "disabled" }
    );
    println!("Output imped.:   {}", flash.impedance());
    println!(
        "Block protect:   {} (SR1 = 0x{:02X})",
        status.block_protect(),
        status.bits()
    );

    Ok(())
}
