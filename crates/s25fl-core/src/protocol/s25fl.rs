//! S25FL064L command sequences
//!
//! Every function here takes the transport by `&mut` and frames its own
//! chip-select window. The window is released on every exit path, including
//! when a transfer inside it fails.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async

use crate::error::{Error, Result};
use crate::register::{Config2, ErrorStatus, Status1, Status2};
use crate::sfdp::{FlashParams, FLASH_PARAMS_LEN};
use crate::spi::{opcodes, AddressWidth, Command, MAX_HEADER_LEN};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Program page size in bytes
pub const PAGE_SIZE: usize = 256;

/// Bytes clocked after the RUID opcode before the unique ID appears
const RUID_DUMMY_LEN: usize = 5;

/// Busy-wait policy
///
/// By default the driver polls the WIP bit until it clears, however long
/// that takes. Setting `max_polls` bounds the wait; once that many polls have
/// still reported the chip busy the operation fails with [`Error::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct BusyPolicy {
    /// Number of busy status reads tolerated, `None` for unbounded
    pub max_polls: Option<u32>,
}

impl BusyPolicy {
    /// Poll until the chip is ready, with no bound
    pub const fn unbounded() -> Self {
        Self { max_polls: None }
    }

    /// Give up after `polls` status reads that still report busy
    pub const fn bounded(polls: u32) -> Self {
        Self {
            max_polls: Some(polls),
        }
    }
}

fn check_range<E>(address: u32, len: usize) -> Result<(), E> {
    if address as u64 + len as u64 > AddressWidth::FourByte.max_size() {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Send `tx` and receive `rx` in a single chip-select window
///
/// `tx` must hold between one and five bytes (opcode plus optional 4-byte
/// address). See [`Transport`] for how `rx` lines up with the clocked bytes.
#[maybe_async]
pub async fn command<T: Transport + ?Sized>(
    transport: &mut T,
    tx: &[u8],
    rx: &mut [u8],
) -> Result<(), T::Error> {
    if tx.is_empty() || tx.len() > MAX_HEADER_LEN {
        return Err(Error::InvalidParameter);
    }

    transport.select(true);
    let result = transport.transfer(tx, rx).await;
    transport.select(false);
    result.map_err(Error::Transport)
}

/// Send an opcode with no address and no response
#[maybe_async]
pub async fn simple<T: Transport + ?Sized>(transport: &mut T, opcode: u8) -> Result<(), T::Error> {
    command(transport, &Command::simple(opcode).header(), &mut []).await
}

/// Read a one-byte register (status or configuration)
///
/// The register value arrives in the second clocked byte.
#[maybe_async]
pub async fn read_register<T: Transport + ?Sized>(
    transport: &mut T,
    opcode: u8,
) -> Result<u8, T::Error> {
    let mut rx = [0u8; 2];
    command(transport, &[opcode], &mut rx).await?;
    Ok(rx[1])
}

/// Read the JEDEC ID
///
/// Returns (manufacturer_id, device_id) on success.
#[maybe_async]
pub async fn read_id<T: Transport + ?Sized>(transport: &mut T) -> Result<(u8, u16), T::Error> {
    let mut rx = [0u8; 4];
    command(transport, &[opcodes::RDID], &mut rx).await?;

    let manufacturer = rx[1];
    let device = u16::from_be_bytes([rx[2], rx[3]]);
    log::debug!(
        "RDID: manufacturer 0x{:02X}, device 0x{:04X}",
        manufacturer,
        device
    );
    Ok((manufacturer, device))
}

/// Read the 64-bit factory unique ID
#[maybe_async]
pub async fn read_unique_id<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<[u8; 8], T::Error> {
    let mut uid = [0u8; 8];
    transport.select(true);
    let result = read_unique_id_selected(transport, &mut uid).await;
    transport.select(false);
    result.map(|()| uid)
}

#[maybe_async]
async fn read_unique_id_selected<T: Transport + ?Sized>(
    transport: &mut T,
    uid: &mut [u8; 8],
) -> Result<(), T::Error> {
    let mut dummy = [0u8; RUID_DUMMY_LEN];
    transport.transfer(&[opcodes::RUID], &mut dummy).await?;
    transport.transfer(&[], uid).await?;
    Ok(())
}

/// Read raw SFDP bytes starting at `address`
///
/// The command is RSFDP, a 3-byte address and one dummy byte. The response
/// bytes clocked during the header are discarded.
#[maybe_async]
pub async fn read_sfdp<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
) -> Result<(), T::Error> {
    if buf.is_empty() {
        return Ok(());
    }

    transport.select(true);
    let result = read_sfdp_selected(transport, address, buf).await;
    transport.select(false);
    result
}

#[maybe_async]
async fn read_sfdp_selected<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
) -> Result<(), T::Error> {
    let header = [
        opcodes::RSFDP,
        (address >> 16) as u8,
        (address >> 8) as u8,
        address as u8,
        0x00,
    ];
    let mut discard = [0u8; MAX_HEADER_LEN];
    transport.transfer(&header, &mut discard).await?;

    let max = transport.max_transfer_len().max(1);
    for chunk in buf.chunks_mut(max) {
        transport.transfer(&[], chunk).await?;
    }
    Ok(())
}

/// Read and parse the SFDP header and its two parameter headers
///
/// A signature mismatch is logged but not treated as an error; callers can
/// check [`FlashParams::is_valid`].
#[maybe_async]
pub async fn read_flash_params<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<FlashParams, T::Error> {
    let mut raw = [0u8; FLASH_PARAMS_LEN];
    read_sfdp(transport, 0, &mut raw).await?;

    let params = FlashParams::parse(&raw);
    if !params.is_valid() {
        log::warn!(
            "SFDP signature mismatch: 0x{:08X}",
            params.header.signature
        );
    }
    Ok(params)
}

/// Read Status Register 1
#[maybe_async]
pub async fn read_status1<T: Transport + ?Sized>(transport: &mut T) -> Result<Status1, T::Error> {
    let bits = read_register(transport, opcodes::RDSR1).await?;
    Ok(Status1::from_bits_retain(bits))
}

/// Read Status Register 2
#[maybe_async]
pub async fn read_status2<T: Transport + ?Sized>(transport: &mut T) -> Result<Status2, T::Error> {
    let bits = read_register(transport, opcodes::RDSR2).await?;
    Ok(Status2::from_bits_retain(bits))
}

/// Read Configuration Register 2
#[maybe_async]
pub async fn read_config2<T: Transport + ?Sized>(transport: &mut T) -> Result<Config2, T::Error> {
    let bits = read_register(transport, opcodes::RDCR2).await?;
    Ok(Config2::from_bits_retain(bits))
}

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<T: Transport + ?Sized>(transport: &mut T) -> Result<(), T::Error> {
    simple(transport, opcodes::WREN).await
}

/// Send the Write Disable command
#[maybe_async]
pub async fn write_disable<T: Transport + ?Sized>(transport: &mut T) -> Result<(), T::Error> {
    simple(transport, opcodes::WRDI).await
}

/// Clear the sticky error bits in Status Register 2
#[maybe_async]
pub async fn clear_status<T: Transport + ?Sized>(transport: &mut T) -> Result<(), T::Error> {
    simple(transport, opcodes::CLSR).await
}

/// Read the program/erase error flags, then clear them
#[maybe_async]
pub async fn read_error_status<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<ErrorStatus, T::Error> {
    let sr2 = read_status2(transport).await?;
    clear_status(transport).await?;

    let status = ErrorStatus::from_status2(sr2);
    if !status.is_empty() {
        log::warn!("Flash reported error status {:?}", status);
    }
    Ok(status)
}

/// Poll Status Register 1 until the WIP bit clears
///
/// [`Transport::on_busy`] is called after every poll that still reads busy.
#[maybe_async]
pub async fn wait_busy<T: Transport + ?Sized>(
    transport: &mut T,
    policy: BusyPolicy,
) -> Result<(), T::Error> {
    let mut polls: u32 = 0;
    loop {
        let status = read_status1(transport).await?;
        if !status.is_busy() {
            return Ok(());
        }

        transport.on_busy();
        polls = polls.saturating_add(1);
        if let Some(max) = policy.max_polls {
            if polls >= max {
                log::error!("Flash still busy after {} polls", polls);
                return Err(Error::Timeout);
            }
        }
    }
}

/// Erase the 4 KiB sector containing `address`
#[maybe_async]
pub async fn erase_sector<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    policy: BusyPolicy,
) -> Result<(), T::Error> {
    log::trace!("Erasing sector at 0x{:08X}", address);
    write_enable(transport).await?;
    let header = Command::with_address(opcodes::SE_4B, address).header();
    command(transport, &header, &mut []).await?;
    wait_busy(transport, policy).await
}

/// Erase the whole chip
#[maybe_async]
pub async fn erase_chip<T: Transport + ?Sized>(
    transport: &mut T,
    policy: BusyPolicy,
) -> Result<(), T::Error> {
    log::debug!("Erasing chip");
    write_enable(transport).await?;
    simple(transport, opcodes::CE).await?;
    wait_busy(transport, policy).await
}

/// Program `data` starting at `address`
///
/// The data is cut into `page_size` pieces. Each piece gets its own
/// WREN/PP_4B sequence and the address advances by the piece length; pieces
/// are not re-aligned to page boundaries, so a write that starts mid-page
/// wraps inside each page the chip sees. Data bytes are sent in transfers no
/// longer than [`Transport::max_transfer_len`].
///
/// If the write enable latch does not set, no program command is sent and
/// [`Error::WriteProtected`] is returned.
#[maybe_async]
pub async fn program<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    data: &[u8],
    page_size: usize,
    policy: BusyPolicy,
) -> Result<(), T::Error> {
    if data.is_empty() {
        return Ok(());
    }
    if page_size == 0 {
        return Err(Error::InvalidParameter);
    }
    check_range(address, data.len())?;

    let mut address = address;
    for page in data.chunks(page_size) {
        write_enable(transport).await?;
        if !read_status1(transport).await?.write_enabled() {
            log::warn!("Write enable latch not set at 0x{:08X}", address);
            return Err(Error::WriteProtected);
        }

        log::trace!("Programming {} bytes at 0x{:08X}", page.len(), address);
        transport.select(true);
        let result = program_page_selected(transport, address, page).await;
        transport.select(false);
        result?;

        wait_busy(transport, policy).await?;
        address = address.wrapping_add(page.len() as u32);
    }

    wait_busy(transport, policy).await
}

#[maybe_async]
async fn program_page_selected<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    page: &[u8],
) -> Result<(), T::Error> {
    let header = Command::with_address(opcodes::PP_4B, address).header();
    transport.transfer(&header, &mut []).await?;

    let max = transport.max_transfer_len().max(1);
    for chunk in page.chunks(max) {
        transport.transfer(chunk, &mut []).await?;
    }
    Ok(())
}

/// Read `buf.len()` bytes starting at `address`
///
/// The whole read happens inside one select window; the data phase is split
/// into transfers no longer than [`Transport::max_transfer_len`].
#[maybe_async]
pub async fn read<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
) -> Result<(), T::Error> {
    if buf.is_empty() {
        return Ok(());
    }
    check_range(address, buf.len())?;

    transport.select(true);
    let result = read_selected(transport, address, buf).await;
    transport.select(false);
    result
}

#[maybe_async]
async fn read_selected<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    buf: &mut [u8],
) -> Result<(), T::Error> {
    let header = Command::with_address(opcodes::READ_4B, address).header();
    transport.transfer(&header, &mut []).await?;

    let max = transport.max_transfer_len().max(1);
    for chunk in buf.chunks_mut(max) {
        transport.transfer(&[], chunk).await?;
    }
    Ok(())
}

/// Put the chip into deep power-down
#[maybe_async]
pub async fn enter_power_down<T: Transport + ?Sized>(transport: &mut T) -> Result<(), T::Error> {
    log::debug!("Entering deep power-down");
    simple(transport, opcodes::DPD).await
}

/// Release the chip from deep power-down and wait until it is ready
#[maybe_async]
pub async fn release_power_down<T: Transport + ?Sized>(
    transport: &mut T,
    policy: BusyPolicy,
) -> Result<(), T::Error> {
    log::debug!("Releasing deep power-down");
    simple(transport, opcodes::RES).await?;
    wait_busy(transport, policy).await
}
