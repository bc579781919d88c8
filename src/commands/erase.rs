//! Erase command implementation

use super::{check_range, covered_sectors, item_progress, Flash};
use crate::error::CliError;
use std::ops::Range;

/// Run the erase command
pub fn run_erase(
    flash: &mut Flash<'_>,
    chip: bool,
    start: u32,
    length: Option<u32>,
) -> Result<(), CliError> {
    if chip {
        println!("Erasing entire chip...");
        flash.erase_chip()?;
    } else {
        let len = length.unwrap_or(0);
        check_range(flash, start, len as u64)?;

        let sector = flash.block_size();
        if start % sector != 0 || len % sector != 0 {
            log::warn!(
                "Range 0x{:08X}+0x{:X} is not sector aligned, erasing every sector it touches",
                start,
                len
            );
        }

        let sectors = covered_sectors(flash, start, len);
        println!("Erasing {} sectors...", sectors.len());
        erase_sectors(flash, sectors)?;
    }

    let status = flash.error_status()?;
    if !status.is_empty() {
        return Err(CliError::ErrorStatus(status));
    }

    println!("Erase complete");
    Ok(())
}

/// Erase a range of sectors with a progress bar
pub(crate) fn erase_sectors(flash: &mut Flash<'_>, sectors: Range<u32>) -> Result<(), CliError> {
    let pb = item_progress(sectors.len() as u64, "sectors")?;
    let sector_size = flash.block_size();

    for sector in sectors {
        flash.erase_sector(sector * sector_size)?;
        pb.inc(1);
    }

    pb.finish_with_message("Erase complete");
    Ok(())
}
