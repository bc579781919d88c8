//! Raw flash self-test
//!
//! Erases each sector in a range, programs every page with a pseudo-random
//! pattern and reads it back. The pattern depends only on the sector and
//! page numbers, so a fault is reproducible across runs.

use core::ops::Range;

use crate::device::{S25fl064l, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// First mismatching byte found by [`raw_memtest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Sector index
    pub sector: u32,
    /// Page index within the sector
    pub page: u32,
    /// Byte offset within the page
    pub byte: usize,
    /// Byte that was programmed
    pub expected: u8,
    /// Byte that was read back
    pub found: u8,
}

impl Fault {
    /// Absolute flash address of the faulty byte
    pub fn address(&self, sector_size: u32) -> u32 {
        self.sector * sector_size + self.page * PAGE_SIZE as u32 + self.byte as u32
    }
}

/// Fill `buf` with the xorshift32 stream for `seed`
pub fn fill_pattern(seed: u32, buf: &mut [u8]) {
    // xorshift has a fixed point at zero
    let mut state = if seed == 0 { 0x9E37_79B9 } else { seed };
    for byte in buf.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *byte = state as u8;
    }
}

fn page_seed(sector: u32, page: u32) -> u32 {
    ((sector << 8) | page) ^ 0x9E37_79B9
}

/// Erase, program and verify every page of `sectors`
///
/// `progress` is called with each sector index once that sector passed.
/// Returns the first mismatch, or `None` if the whole range verified.
#[maybe_async]
pub async fn raw_memtest<T, F>(
    device: &mut S25fl064l<'_, T>,
    sectors: Range<u32>,
    mut progress: F,
) -> Result<Option<Fault>, T::Error>
where
    T: Transport + ?Sized,
    F: FnMut(u32),
{
    if !device.is_initialized() {
        return Err(Error::NotInitialized);
    }
    if sectors.end > device.block_count() {
        return Err(Error::AddressOutOfBounds);
    }

    let sector_size = device.block_size();
    let pages = sector_size / PAGE_SIZE as u32;
    let mut expected = [0u8; PAGE_SIZE];
    let mut found = [0u8; PAGE_SIZE];

    for sector in sectors {
        let base = sector * sector_size;
        device.erase_sector(base).await?;

        for page in 0..pages {
            let address = base + page * PAGE_SIZE as u32;
            fill_pattern(page_seed(sector, page), &mut expected);
            device.write(address, &expected).await?;
            device.read(address, &mut found).await?;

            if let Some(byte) = expected.iter().zip(found.iter()).position(|(e, f)| e != f) {
                let fault = Fault {
                    sector,
                    page,
                    byte,
                    expected: expected[byte],
                    found: found[byte],
                };
                log::error!(
                    "Memtest mismatch at 0x{:08X}: wrote 0x{:02X}, read 0x{:02X}",
                    fault.address(sector_size),
                    fault.expected,
                    fault.found
                );
                return Ok(Some(fault));
            }
        }

        log::trace!("Sector {} passed", sector);
        progress(sector);
    }

    Ok(None)
}
