//! s25fl-dummy - In-memory S25FL064L emulator for testing
//!
//! This crate provides a [`Transport`] that emulates the flash chip behind
//! the bus. It decodes the byte stream of every chip-select window the way
//! the chip does, commits program and erase commands when chip-select is
//! released, and records every bus event so tests can assert on the exact
//! traffic the driver produced.
//!
//! Fault injection covers failed transfers, a stuck WIP bit, a chip that
//! refuses to set its write enable latch and sticky program/erase errors.

use s25fl_core::device::{BLOCK_SIZE, DEVICE_ID, MANUFACTURER_ID, PAGE_SIZE, TOTAL_SIZE};
use s25fl_core::register::{Status1, Status2};
use s25fl_core::spi::opcodes;
use s25fl_core::transport::{Transport, DEFAULT_MAX_TRANSFER_LEN};

/// SFDP header and parameter headers of a real S25FL064L
pub const S25FL064L_SFDP: [u8; 24] = [
    0x53, 0x46, 0x44, 0x50, 0x06, 0x01, 0x01, 0xFF, // "SFDP" rev 1.6, 2 headers
    0x00, 0x06, 0x01, 0x10, 0x10, 0x00, 0x00, 0xFF, // BFPT at 0x10
    0x81, 0x00, 0x01, 0x04, 0x50, 0x00, 0x00, 0xFF, // sector map at 0x50
];

/// Electronic signature returned after RES
const RES_SIGNATURE: u8 = 0x16;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Factory unique ID
    pub unique_id: [u8; 8],
    /// Configuration Register 2 value
    pub config2: u8,
    /// SFDP area, reads past its end return 0xFF
    pub sfdp: Vec<u8>,
    /// Flash size in bytes, rounded up to whole sectors
    pub size: usize,
    /// Status polls that report WIP after each program or erase
    pub busy_polls: u32,
    /// Longest transfer accepted in one call
    pub max_transfer_len: usize,
    /// Never set the write enable latch
    pub write_protect: bool,
    /// Fail the n-th transfer (0-based, counted from creation)
    pub fail_transfer_at: Option<usize>,
    /// Keep WIP set forever after the first program or erase
    pub stuck_busy: bool,
    /// Flag a program error in SR2 on every page program
    pub program_error: bool,
    /// Flag an erase error in SR2 on every erase
    pub erase_error: bool,
    /// Byte address and mask of cells whose masked bits always read as zero
    pub stuck_low: Option<(usize, u8)>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: MANUFACTURER_ID,
            device_id: DEVICE_ID,
            unique_id: [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
            config2: 0x60,
            sfdp: S25FL064L_SFDP.to_vec(),
            size: TOTAL_SIZE as usize,
            busy_polls: 2,
            max_transfer_len: DEFAULT_MAX_TRANSFER_LEN,
            write_protect: false,
            fail_transfer_at: None,
            stuck_busy: false,
            program_error: false,
            erase_error: false,
            stuck_low: None,
        }
    }
}

/// Error returned by the emulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyError {
    /// Failure injected through [`DummyConfig::fail_transfer_at`]
    Injected,
    /// A transfer was attempted with chip-select released
    NotSelected,
    /// A transfer exceeded [`DummyConfig::max_transfer_len`]
    TransferTooLong(usize),
}

impl std::fmt::Display for DummyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injected => write!(f, "injected transfer failure"),
            Self::NotSelected => write!(f, "transfer outside a chip-select window"),
            Self::TransferTooLong(len) => write!(f, "transfer of {} bytes is too long", len),
        }
    }
}

impl std::error::Error for DummyError {}

/// One observable bus event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip-select asserted
    Select,
    /// Chip-select released
    Deselect,
    /// A transfer call, with the bytes sent and the receive length
    Transfer {
        /// Bytes driven on MOSI
        tx: Vec<u8>,
        /// Length of the receive buffer
        rx_len: usize,
    },
    /// Hardware reset pulse
    Reset,
    /// Busy hook invoked
    Busy,
}

/// Program data staged during a PP window
struct PendingProgram {
    page_base: usize,
    buf: [u8; PAGE_SIZE],
}

/// Dummy flash chip
///
/// Emulates the chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    status1: Status1,
    status2: Status2,
    busy_remaining: u32,
    stuck: bool,
    powered_down: bool,
    reset_enabled: bool,
    selected: bool,
    opcode: Option<u8>,
    position: usize,
    address: u32,
    pending: Option<PendingProgram>,
    transfers: usize,
    events: Vec<BusEvent>,
}

impl DummyFlash {
    /// Create a new erased dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let sector = BLOCK_SIZE as usize;
        let size = config.size.max(1).div_ceil(sector) * sector;
        if size != config.size {
            log::warn!("Dummy: rounding size {} up to {} bytes", config.size, size);
        }
        let data = vec![0xFF; size];
        Self {
            config,
            data,
            status1: Status1::empty(),
            status2: Status2::empty(),
            busy_remaining: 0,
            stuck: false,
            powered_down: false,
            reset_enabled: false,
            selected: false,
            opcode: None,
            position: 0,
            address: 0,
            pending: None,
            transfers: 0,
            events: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration (S25FL064L)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the emulator and return the flash contents
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration
    ///
    /// Lets a test switch fault injection on after initialization.
    pub fn config_mut(&mut self) -> &mut DummyConfig {
        &mut self.config
    }

    /// Whether the chip is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Whether chip-select is currently asserted
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Current Status Register 2 bits
    pub fn status2(&self) -> Status2 {
        self.status2
    }

    /// Recorded bus events
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget recorded bus events
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// MOSI bytes of each complete select window, in order
    pub fn windows(&self) -> Vec<Vec<u8>> {
        let mut windows = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in &self.events {
            match event {
                BusEvent::Select => current = Some(Vec::new()),
                BusEvent::Transfer { tx, rx_len } => {
                    if let Some(window) = current.as_mut() {
                        window.extend_from_slice(tx);
                        // Bytes clocked past tx go out as zeros
                        window.resize(window.len() + rx_len.saturating_sub(tx.len()), 0);
                    }
                }
                BusEvent::Deselect => {
                    if let Some(window) = current.take() {
                        windows.push(window);
                    }
                }
                _ => {}
            }
        }
        windows
    }

    /// Opcode of each select window, in order
    pub fn commands(&self) -> Vec<u8> {
        self.windows()
            .iter()
            .filter_map(|w| w.first().copied())
            .collect()
    }

    /// Number of select windows that started with `opcode`
    pub fn count_command(&self, opcode: u8) -> usize {
        self.commands().iter().filter(|&&op| op == opcode).count()
    }

    /// Every select is matched by a deselect and none is left open
    pub fn cs_balanced(&self) -> bool {
        let mut open = false;
        for event in &self.events {
            match event {
                BusEvent::Select if open => return false,
                BusEvent::Select => open = true,
                BusEvent::Deselect if !open => return false,
                BusEvent::Deselect => open = false,
                _ => {}
            }
        }
        !open
    }

    /// Number of busy hook invocations recorded
    pub fn busy_hook_calls(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BusEvent::Busy))
            .count()
    }

    fn wrap(&self, address: usize) -> usize {
        address % self.data.len().max(1)
    }

    fn read_cell(&self, index: usize) -> u8 {
        match self.config.stuck_low {
            Some((address, mask)) if address == index => self.data[index] & !mask,
            _ => self.data[index],
        }
    }

    fn poll_status1(&mut self) -> u8 {
        let mut status = self.status1;
        if self.stuck {
            status |= Status1::WIP;
        } else if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            status |= Status1::WIP;
        }
        status.bits()
    }

    /// Accumulate one address byte, returns true once `len` bytes are in
    fn address_byte(&mut self, mosi: u8, len: usize) -> bool {
        if self.position <= len {
            self.address = (self.address << 8) | mosi as u32;
        }
        self.position == len
    }

    /// Clock one byte through the chip
    fn clock(&mut self, mosi: u8) -> u8 {
        self.position += 1;
        let position = self.position;

        if position == 1 {
            self.address = 0;
            if self.powered_down && mosi != opcodes::RES {
                log::trace!("Ignoring opcode 0x{:02X} in deep power-down", mosi);
                self.opcode = None;
            } else {
                self.opcode = Some(mosi);
            }
            return 0xFF;
        }

        let Some(opcode) = self.opcode else {
            return 0xFF;
        };

        match opcode {
            opcodes::RDSR1 => self.poll_status1(),
            opcodes::RDSR2 => self.status2.bits(),
            opcodes::RDCR2 => self.config.config2,
            opcodes::RDCR1 | opcodes::RDCR3 => 0x00,
            opcodes::RDID => match position {
                2 => self.config.manufacturer_id,
                3 => (self.config.device_id >> 8) as u8,
                4 => self.config.device_id as u8,
                _ => 0x00,
            },
            opcodes::RUID => {
                // Opcode, four dummy bytes, then the ID
                let index = position.saturating_sub(6);
                if position >= 6 && index < 8 {
                    self.config.unique_id[index]
                } else {
                    0x00
                }
            }
            opcodes::RSFDP => {
                if position <= 4 {
                    self.address_byte(mosi, 4);
                    0x00
                } else if position == 5 {
                    0x00
                } else {
                    let index = self.address as usize + position - 6;
                    self.config.sfdp.get(index).copied().unwrap_or(0xFF)
                }
            }
            opcodes::READ | opcodes::READ_4B => {
                let len = if opcode == opcodes::READ { 3 } else { 4 };
                if position <= len + 1 {
                    self.address_byte(mosi, len + 1);
                    0x00
                } else {
                    let index = self.wrap(self.address as usize + position - len - 2);
                    self.read_cell(index)
                }
            }
            opcodes::PP | opcodes::PP_4B => {
                let len = if opcode == opcodes::PP { 3 } else { 4 };
                if position <= len + 1 {
                    if self.address_byte(mosi, len + 1) {
                        let page_base = self.wrap(self.address as usize) & !(PAGE_SIZE - 1);
                        self.pending = Some(PendingProgram {
                            page_base,
                            buf: [0xFF; PAGE_SIZE],
                        });
                    }
                } else if let Some(pending) = self.pending.as_mut() {
                    // The column address wraps inside the page
                    let offset = (self.address as usize + position - len - 2) % PAGE_SIZE;
                    pending.buf[offset] = mosi;
                }
                0xFF
            }
            opcodes::SE_4B => {
                if position <= 5 {
                    self.address_byte(mosi, 5);
                }
                0xFF
            }
            opcodes::RES => {
                if position >= 5 {
                    RES_SIGNATURE
                } else {
                    0x00
                }
            }
            _ => 0xFF,
        }
    }

    /// Act on the command of the window that just closed
    fn commit(&mut self) {
        let Some(opcode) = self.opcode.take() else {
            return;
        };
        let complete = self.position;
        let write_enabled = self.status1.contains(Status1::WEL);

        match opcode {
            opcodes::WREN => {
                if !self.config.write_protect {
                    self.status1.insert(Status1::WEL);
                }
            }
            opcodes::WRDI => self.status1.remove(Status1::WEL),
            opcodes::CLSR => self.status2.remove(Status2::P_ERR | Status2::E_ERR),
            opcodes::PP | opcodes::PP_4B => {
                let pending = self.pending.take();
                if let (true, Some(pending)) = (write_enabled, pending) {
                    log::debug!("Dummy: page program at 0x{:06X}", pending.page_base);
                    let page = &mut self.data[pending.page_base..pending.page_base + PAGE_SIZE];
                    for (cell, byte) in page.iter_mut().zip(pending.buf.iter()) {
                        *cell &= *byte;
                    }
                    if self.config.program_error {
                        self.status2.insert(Status2::P_ERR);
                    }
                    self.finish_write();
                }
            }
            opcodes::SE_4B if write_enabled && complete >= 5 => {
                let sector = BLOCK_SIZE as usize;
                let base = self.wrap(self.address as usize) & !(sector - 1);
                log::debug!("Dummy: sector erase at 0x{:06X}", base);
                self.data[base..base + sector].fill(0xFF);
                if self.config.erase_error {
                    self.status2.insert(Status2::E_ERR);
                }
                self.finish_write();
            }
            opcodes::CE if write_enabled => {
                log::debug!("Dummy: chip erase");
                self.data.fill(0xFF);
                if self.config.erase_error {
                    self.status2.insert(Status2::E_ERR);
                }
                self.finish_write();
            }
            opcodes::DPD => self.powered_down = true,
            opcodes::RES => {
                if self.powered_down {
                    self.busy_remaining = self.config.busy_polls;
                }
                self.powered_down = false;
            }
            opcodes::RSTEN => {
                self.reset_enabled = true;
                return;
            }
            opcodes::RST if self.reset_enabled => self.reset_state(),
            _ => {}
        }
        self.reset_enabled = false;
    }

    fn finish_write(&mut self) {
        self.status1.remove(Status1::WEL);
        self.busy_remaining = self.config.busy_polls;
        self.stuck = self.config.stuck_busy;
    }

    fn reset_state(&mut self) {
        self.status1.remove(Status1::WEL | Status1::WIP);
        self.busy_remaining = 0;
        self.stuck = false;
        self.powered_down = false;
        self.reset_enabled = false;
        self.pending = None;
    }
}

impl Transport for DummyFlash {
    type Error = DummyError;

    fn reset(&mut self) {
        self.events.push(BusEvent::Reset);
        self.reset_state();
    }

    fn select(&mut self, select: bool) {
        if select {
            self.events.push(BusEvent::Select);
            self.selected = true;
            self.opcode = None;
            self.position = 0;
            self.pending = None;
        } else {
            self.events.push(BusEvent::Deselect);
            if self.selected {
                self.commit();
            }
            self.selected = false;
        }
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), DummyError> {
        self.events.push(BusEvent::Transfer {
            tx: tx.to_vec(),
            rx_len: rx.len(),
        });

        let index = self.transfers;
        self.transfers += 1;
        if self.config.fail_transfer_at == Some(index) {
            return Err(DummyError::Injected);
        }
        if !self.selected {
            return Err(DummyError::NotSelected);
        }

        let len = tx.len().max(rx.len());
        if len > self.config.max_transfer_len {
            return Err(DummyError::TransferTooLong(len));
        }

        for i in 0..len {
            let miso = self.clock(tx.get(i).copied().unwrap_or(0x00));
            if let Some(slot) = rx.get_mut(i) {
                *slot = miso;
            }
        }
        Ok(())
    }

    fn on_busy(&mut self) {
        self.events.push(BusEvent::Busy);
    }

    fn max_transfer_len(&self) -> usize {
        self.config.max_transfer_len
    }
}
