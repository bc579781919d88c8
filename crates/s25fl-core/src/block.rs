//! Block-device adapter
//!
//! Exposes the flash as erase blocks of [`BLOCK_SIZE`](crate::device::BLOCK_SIZE)
//! bytes, the shape a wear-leveling filesystem expects. Unlike the raw
//! device handle, every call here refuses to run before initialization and
//! checks that the access stays inside one block of the device.

use crate::device::S25fl064l;
use crate::error::{Error, Result};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Block-oriented view of an initialized device
pub struct BlockDevice<'d, 'a, T: Transport + ?Sized> {
    device: &'d mut S25fl064l<'a, T>,
}

impl<'d, 'a, T: Transport + ?Sized> BlockDevice<'d, 'a, T> {
    /// Wrap a device handle
    pub fn new(device: &'d mut S25fl064l<'a, T>) -> Self {
        Self { device }
    }

    /// Erase block size in bytes
    pub fn block_size(&self) -> u32 {
        self.device.block_size()
    }

    /// Number of erase blocks
    pub fn block_count(&self) -> u32 {
        self.device.block_count()
    }

    fn address(&self, block: u32, offset: u32, len: usize) -> Result<u32, T::Error> {
        if !self.device.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let block_size = self.device.block_size() as u64;
        if block >= self.device.block_count() || offset as u64 + len as u64 > block_size {
            return Err(Error::AddressOutOfBounds);
        }
        Ok((block as u64 * block_size + offset as u64) as u32)
    }

    /// Read `buf.len()` bytes from `block` at `offset`
    #[maybe_async]
    pub async fn read(&mut self, block: u32, offset: u32, buf: &mut [u8]) -> Result<(), T::Error> {
        let address = self.address(block, offset, buf.len())?;
        self.device.read(address, buf).await
    }

    /// Program `data` into `block` at `offset`
    ///
    /// The block must have been erased first.
    #[maybe_async]
    pub async fn prog(&mut self, block: u32, offset: u32, data: &[u8]) -> Result<(), T::Error> {
        let address = self.address(block, offset, data.len())?;
        self.device.write(address, data).await
    }

    /// Erase `block`
    #[maybe_async]
    pub async fn erase(&mut self, block: u32) -> Result<(), T::Error> {
        let address = self.address(block, 0, 0)?;
        self.device.erase_sector(address).await
    }

    /// Flush pending writes
    ///
    /// Every operation completes before returning, so there is nothing to
    /// flush.
    #[maybe_async]
    pub async fn sync(&mut self) -> Result<(), T::Error> {
        if !self.device.is_initialized() {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }
}
