//! S25FL064L SPI flash opcodes
//!
//! Command codes as listed in the S25FL064L datasheet command set table.
//! Only the 4-byte-address variants of the read, program and erase commands
//! are issued by the driver; the 3-byte ones are kept for reference and for
//! the emulator.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - sets WEL, required before any program/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status and configuration registers
// ============================================================================

/// Read Status Register 1
pub const RDSR1: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x07;
/// Read Configuration Register 1
pub const RDCR1: u8 = 0x35;
/// Read Configuration Register 2
pub const RDCR2: u8 = 0x15;
/// Read Configuration Register 3
pub const RDCR3: u8 = 0x33;
/// Clear Status Register (resets the sticky P_ERR/E_ERR bits)
pub const CLSR: u8 = 0x30;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC manufacturer and device ID
pub const RDID: u8 = 0x9F;
/// Read 64-bit Unique ID
pub const RUID: u8 = 0x4B;
/// Read Serial Flash Discoverable Parameters
pub const RSFDP: u8 = 0x5A;

// ============================================================================
// Read
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Read Data with 4-byte address
pub const READ_4B: u8 = 0x13;

// ============================================================================
// Program
// ============================================================================

/// Page Program with 3-byte address
pub const PP: u8 = 0x02;
/// Page Program with 4-byte address
pub const PP_4B: u8 = 0x12;

// ============================================================================
// Erase
// ============================================================================

/// 4 KiB Sector Erase with 4-byte address
pub const SE_4B: u8 = 0x21;
/// Chip Erase
pub const CE: u8 = 0x60;

// ============================================================================
// Power and reset
// ============================================================================

/// Deep Power-Down
pub const DPD: u8 = 0xB9;
/// Release from Deep Power-Down
pub const RES: u8 = 0xAB;
/// Software Reset Enable
pub const RSTEN: u8 = 0x66;
/// Software Reset
pub const RST: u8 = 0x99;
/// Set Pointer Region
pub const SPRP: u8 = 0xFB;
