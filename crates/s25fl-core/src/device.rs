//! Device handle
//!
//! [`S25fl064l`] borrows a [`Transport`] and keeps the state learned during
//! initialization: identification, unique ID, SFDP parameter headers and the
//! configuration bits read from CR2.

use crate::error::{Error, Result};
use crate::protocol::{self, BusyPolicy};
use crate::register::{ErrorStatus, Impedance, Status1};
use crate::sfdp::FlashParams;
use crate::spi::AddressWidth;
use crate::transport::Transport;
use maybe_async::maybe_async;

pub use crate::protocol::PAGE_SIZE;

/// Erase sector size, which is also the block size exposed to consumers
pub const BLOCK_SIZE: u32 = 4096;

/// Number of sectors on the chip
pub const BLOCK_COUNT: u32 = 2048;

/// Total capacity in bytes (8 MiB)
pub const TOTAL_SIZE: u32 = BLOCK_SIZE * BLOCK_COUNT;

/// Expected JEDEC manufacturer ID
pub const MANUFACTURER_ID: u8 = 0x01;

/// Expected JEDEC device ID
pub const DEVICE_ID: u16 = 0x6017;

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct Config {
    /// How long to keep polling a busy chip
    pub busy: BusyPolicy,
}

/// S25FL064L device handle
///
/// Operations other than [`initialize`](Self::initialize) do not check the
/// initialized flag; the [`BlockDevice`](crate::block::BlockDevice) adapter
/// does.
pub struct S25fl064l<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    config: Config,
    initialized: bool,
    powered_down: bool,
    write_protected: bool,
    short_address: bool,
    qpi_mode: bool,
    impedance: Impedance,
    manufacturer_id: u8,
    device_id: u16,
    unique_id: [u8; 8],
    params: Option<FlashParams>,
    block_size: u32,
    block_count: u32,
}

impl<'a, T: Transport + ?Sized> S25fl064l<'a, T> {
    /// Create an uninitialized handle with the default configuration
    pub fn new(transport: &'a mut T) -> Self {
        Self::with_config(transport, Config::default())
    }

    /// Create an uninitialized handle
    pub fn with_config(transport: &'a mut T, config: Config) -> Self {
        Self {
            transport,
            config,
            initialized: false,
            powered_down: false,
            write_protected: false,
            short_address: false,
            qpi_mode: false,
            impedance: Impedance::default(),
            manufacturer_id: 0,
            device_id: 0,
            unique_id: [0; 8],
            params: None,
            block_size: 0,
            block_count: 0,
        }
    }

    /// Bring the chip up and learn its identity and configuration
    ///
    /// Releases deep power-down, pulses the hardware reset line, then reads
    /// the JEDEC ID, unique ID, SFDP headers and CR2. The identity is stored
    /// but not validated; see [`verify_identity`](Self::verify_identity).
    #[maybe_async]
    pub async fn initialize(&mut self) -> Result<(), T::Error> {
        self.initialized = false;

        self.leave_power_down().await?;
        self.reset();

        let (manufacturer, device) = protocol::read_id(self.transport).await?;
        self.manufacturer_id = manufacturer;
        self.device_id = device;

        self.unique_id = protocol::read_unique_id(self.transport).await?;
        self.params = Some(protocol::read_flash_params(self.transport).await?);

        let cr2 = protocol::read_config2(self.transport).await?;
        self.short_address = cr2.short_address();
        self.qpi_mode = cr2.qpi();
        self.impedance = cr2.impedance();

        self.block_size = BLOCK_SIZE;
        self.block_count = BLOCK_COUNT;
        self.write_protected = false;
        self.initialized = true;

        log::info!(
            "Flash initialized: manufacturer 0x{:02X}, device 0x{:04X}, {} x {} bytes",
            self.manufacturer_id,
            self.device_id,
            self.block_count,
            self.block_size
        );
        if !self.verify_identity() {
            log::warn!(
                "Unexpected flash identity 0x{:02X}/0x{:04X}",
                self.manufacturer_id,
                self.device_id
            );
        }
        Ok(())
    }

    /// Read `buf.len()` bytes starting at `address`
    #[maybe_async]
    pub async fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), T::Error> {
        protocol::read(self.transport, address, buf).await
    }

    /// Program `data` starting at `address`
    ///
    /// The target range must have been erased. The outcome of the write
    /// enable check is remembered in [`is_write_protected`](Self::is_write_protected).
    #[maybe_async]
    pub async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), T::Error> {
        let result =
            protocol::program(self.transport, address, data, PAGE_SIZE, self.config.busy).await;
        match &result {
            Ok(()) => self.write_protected = false,
            Err(Error::WriteProtected) => self.write_protected = true,
            Err(_) => {}
        }
        result
    }

    /// Erase the sector containing `address`
    #[maybe_async]
    pub async fn erase_sector(&mut self, address: u32) -> Result<(), T::Error> {
        protocol::erase_sector(self.transport, address, self.config.busy).await
    }

    /// Erase the whole chip
    #[maybe_async]
    pub async fn erase_chip(&mut self) -> Result<(), T::Error> {
        protocol::erase_chip(self.transport, self.config.busy).await
    }

    /// Enter deep power-down
    #[maybe_async]
    pub async fn enter_power_down(&mut self) -> Result<(), T::Error> {
        protocol::enter_power_down(self.transport).await?;
        self.powered_down = true;
        Ok(())
    }

    /// Leave deep power-down and wait for the chip to become ready
    #[maybe_async]
    pub async fn leave_power_down(&mut self) -> Result<(), T::Error> {
        protocol::release_power_down(self.transport, self.config.busy).await?;
        self.powered_down = false;
        Ok(())
    }

    /// Pulse the hardware reset line
    ///
    /// The chip has to be initialized again afterwards.
    pub fn reset(&mut self) {
        log::debug!("Hardware reset");
        self.transport.reset();
        self.initialized = false;
    }

    /// Read and clear the program/erase error flags
    #[maybe_async]
    pub async fn error_status(&mut self) -> Result<ErrorStatus, T::Error> {
        protocol::read_error_status(self.transport).await
    }

    /// Read Status Register 1
    #[maybe_async]
    pub async fn status(&mut self) -> Result<Status1, T::Error> {
        protocol::read_status1(self.transport).await
    }

    /// Whether [`initialize`](Self::initialize) completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the handle last put the chip into deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Whether the last write failed the write enable check
    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    /// Whether CR2 selects 3-byte addressing
    pub fn short_address(&self) -> bool {
        self.short_address
    }

    /// Address width the chip is configured for
    ///
    /// Informational; the driver always uses the 4-byte-address opcodes.
    pub fn address_width(&self) -> AddressWidth {
        if self.short_address {
            AddressWidth::ThreeByte
        } else {
            AddressWidth::FourByte
        }
    }

    /// Whether CR2 reports QPI mode
    pub fn qpi_mode(&self) -> bool {
        self.qpi_mode
    }

    /// Output impedance selection read from CR2
    pub fn impedance(&self) -> Impedance {
        self.impedance
    }

    /// JEDEC manufacturer ID read during initialization
    pub fn manufacturer_id(&self) -> u8 {
        self.manufacturer_id
    }

    /// JEDEC device ID read during initialization
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// Factory unique ID read during initialization
    pub fn unique_id(&self) -> [u8; 8] {
        self.unique_id
    }

    /// SFDP headers read during initialization
    pub fn flash_params(&self) -> Option<&FlashParams> {
        self.params.as_ref()
    }

    /// Erase block size in bytes (0 before initialization)
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Number of erase blocks (0 before initialization)
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Capacity in bytes (0 before initialization)
    pub fn size(&self) -> u32 {
        self.block_size * self.block_count
    }

    /// Driver configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the stored identity against the S25FL064L IDs
    pub fn verify_identity(&self) -> bool {
        self.manufacturer_id == MANUFACTURER_ID && self.device_id == DEVICE_ID
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &*self.transport
    }

    /// Mutably borrow the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut *self.transport
    }
}
