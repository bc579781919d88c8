//! Read command implementation

use super::{byte_progress, check_range, Flash};
use crate::error::CliError;
use crate::image;
use std::path::Path;

/// Default chunk size for reading (4 KiB)
const READ_CHUNK_SIZE: usize = 4096;

/// Run the read command
pub fn run_read(
    flash: &mut Flash<'_>,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> Result<(), CliError> {
    let len = length.unwrap_or_else(|| flash.size().saturating_sub(start));
    check_range(flash, start, len as u64)?;

    let data = read_with_progress(flash, start, len as usize)?;
    image::write_file(output, &data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read a region with a progress bar
pub fn read_with_progress(
    flash: &mut Flash<'_>,
    start: u32,
    len: usize,
) -> Result<Vec<u8>, CliError> {
    let mut data = vec![0u8; len];

    let pb = byte_progress(len as u64)?;
    let mut offset = 0usize;
    for chunk in data.chunks_mut(READ_CHUNK_SIZE) {
        flash.read(start + offset as u32, chunk)?;
        offset += chunk.len();
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
