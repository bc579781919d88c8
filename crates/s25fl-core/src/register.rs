//! Status and configuration register decoding
//!
//! Register contents are decoded with explicit bit masks rather than
//! packed bitfield structs, so the meaning of each bit does not depend on
//! compiler layout.

use bitflags::bitflags;

bitflags! {
    /// Status Register 1 (RDSR1, 0x05)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status1: u8 {
        /// Write In Progress - an internal program/erase is running
        const WIP    = 1 << 0;
        /// Write Enable Latch
        const WEL    = 1 << 1;
        /// Legacy block protection bit 0
        const BP0    = 1 << 2;
        /// Legacy block protection bit 1
        const BP1    = 1 << 3;
        /// Legacy block protection bit 2
        const BP2    = 1 << 4;
        /// Top or bottom relative protection
        const TBPROT = 1 << 5;
        /// Sector or block protect
        const SEC    = 1 << 6;
        /// Status register protect 0
        const SRP0   = 1 << 7;
    }
}

impl Status1 {
    /// Returns true while the chip is committing a program or erase
    pub fn is_busy(&self) -> bool {
        self.contains(Self::WIP)
    }

    /// Returns true if the write enable latch is set
    pub fn write_enabled(&self) -> bool {
        self.contains(Self::WEL)
    }

    /// Legacy block protection field (BP2..BP0)
    pub fn block_protect(&self) -> u8 {
        (self.bits() >> 2) & 0x07
    }
}

bitflags! {
    /// Status Register 2 (RDSR2, 0x07)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status2: u8 {
        /// Program suspended
        const PS    = 1 << 0;
        /// Erase suspended
        const ES    = 1 << 1;
        /// Programming error occurred (sticky until CLSR)
        const P_ERR = 1 << 5;
        /// Erase error occurred (sticky until CLSR)
        const E_ERR = 1 << 6;
    }
}

bitflags! {
    /// Configuration Register 2 (RDCR2, 0x15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Config2: u8 {
        /// Address length: set for 4-byte addressing, clear for 3-byte
        const ADDR_LENGTH = 1 << 0;
        /// QPI (4-4-4) mode enabled
        const QPI         = 1 << 3;
        /// Output impedance select bit 0
        const OI0         = 1 << 5;
        /// Output impedance select bit 1
        const OI1         = 1 << 6;
    }
}

impl Config2 {
    /// Returns true if the chip expects 3-byte addresses
    pub fn short_address(&self) -> bool {
        !self.contains(Self::ADDR_LENGTH)
    }

    /// Returns true if the chip is in QPI mode
    pub fn qpi(&self) -> bool {
        self.contains(Self::QPI)
    }

    /// Decoded output impedance selection
    pub fn impedance(&self) -> Impedance {
        Impedance::from_bits((self.bits() >> 5) & 0x03)
    }
}

bitflags! {
    /// Sticky error flags reported by
    /// [`read_error_status`](crate::protocol::read_error_status)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ErrorStatus: u8 {
        /// The last program operation failed
        const PROGRAM = 1 << 0;
        /// The last erase operation failed
        const ERASE   = 1 << 1;
    }
}

impl ErrorStatus {
    /// Extract the error flags from a Status Register 2 value
    pub fn from_status2(sr2: Status2) -> Self {
        Self::from_bits_truncate((sr2.bits() & 0x60) >> 5)
    }
}

/// Output impedance selection (CR2 bits 6:5)
///
/// Informational only, the driver never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Impedance {
    /// Impedance selection 0
    #[default]
    Imp0,
    /// Impedance selection 1
    Imp1,
    /// Impedance selection 2
    Imp2,
    /// Impedance selection 3
    Imp3,
}

impl Impedance {
    /// Decode from the two-bit register field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Imp0,
            1 => Self::Imp1,
            2 => Self::Imp2,
            _ => Self::Imp3,
        }
    }
}

impl core::fmt::Display for Impedance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let index = match self {
            Self::Imp0 => 0,
            Self::Imp1 => 1,
            Self::Imp2 => 2,
            Self::Imp3 => 3,
        };
        write!(f, "selection {}", index)
    }
}
