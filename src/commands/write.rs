//! Write command implementation

use super::{byte_progress, check_range, covered_sectors, Flash};
use crate::commands::erase::erase_sectors;
use crate::commands::read::read_with_progress;
use crate::error::CliError;
use crate::image;
use s25fl_core::device::PAGE_SIZE;
use std::path::Path;

/// Run the write command
pub fn run_write(
    flash: &mut Flash<'_>,
    input: &Path,
    start: u32,
    erase: bool,
    verify: bool,
) -> Result<(), CliError> {
    let data = image::read_file(input)?;
    check_range(flash, start, data.len() as u64)?;
    if data.is_empty() {
        println!("Nothing to write");
        return Ok(());
    }

    if erase {
        let sectors = covered_sectors(flash, start, data.len() as u32);
        println!("Erasing {} sectors...", sectors.len());
        erase_sectors(flash, sectors)?;
    }

    println!("Writing {} bytes at 0x{:08X}...", data.len(), start);
    write_with_progress(flash, start, &data)?;

    let status = flash.error_status()?;
    if !status.is_empty() {
        return Err(CliError::ErrorStatus(status));
    }

    if verify {
        println!("Verifying...");
        let readback = read_with_progress(flash, start, data.len())?;
        if let Some(i) = data.iter().zip(readback.iter()).position(|(a, b)| a != b) {
            return Err(CliError::VerifyFailed {
                address: start + i as u32,
                expected: data[i],
                found: readback[i],
            });
        }
        println!("Verification passed");
    }

    println!("Write complete");
    Ok(())
}

/// Program `data` in page-aligned pieces with a progress bar
fn write_with_progress(flash: &mut Flash<'_>, start: u32, data: &[u8]) -> Result<(), CliError> {
    let pb = byte_progress(data.len() as u64)?;

    let mut offset = 0usize;
    while offset < data.len() {
        let address = start + offset as u32;
        // Stop at the page boundary so the chip never wraps inside a page
        let room = PAGE_SIZE - (address as usize % PAGE_SIZE);
        let len = room.min(data.len() - offset);

        flash.write(address, &data[offset..offset + len])?;

        offset += len;
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Write complete");
    Ok(())
}
