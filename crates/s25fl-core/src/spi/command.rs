//! Command header framing

use super::AddressWidth;
use heapless::Vec;

/// Longest header the driver ever sends: opcode plus a 4-byte address
pub const MAX_HEADER_LEN: usize = 5;

/// Opcode with an optional address
///
/// The driver always issues the 4-byte-address command variants, so an
/// address is encoded as four bytes regardless of the address width the
/// chip is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// The opcode byte
    pub opcode: u8,
    /// Address (if any)
    pub address: Option<u32>,
}

impl Command {
    /// Create a command with no address (e.g., WREN, RDSR1)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
        }
    }

    /// Create a command followed by a 4-byte address (e.g., PP_4B, SE_4B)
    pub const fn with_address(opcode: u8, address: u32) -> Self {
        Self {
            opcode,
            address: Some(address),
        }
    }

    /// Number of header bytes this command puts on the wire
    pub fn header_len(&self) -> usize {
        1 + self.address.map_or(0, |_| AddressWidth::FourByte.bytes())
    }

    /// Encode the opcode and address into the wire header
    pub fn header(&self) -> Vec<u8, MAX_HEADER_LEN> {
        let mut buf = [0u8; MAX_HEADER_LEN];
        buf[0] = self.opcode;
        if let Some(address) = self.address {
            AddressWidth::FourByte.encode(address, &mut buf[1..]);
        }
        // header_len() never exceeds MAX_HEADER_LEN
        Vec::from_slice(&buf[..self.header_len()]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_simple_header() {
        let cmd = Command::simple(opcodes::WREN);
        assert_eq!(cmd.header_len(), 1);
        assert_eq!(cmd.header().as_slice(), &[0x06]);
    }

    #[test]
    fn test_address_header_is_four_bytes_big_endian() {
        let cmd = Command::with_address(opcodes::PP_4B, 0x0001_0200);
        assert_eq!(cmd.header_len(), 5);
        assert_eq!(cmd.header().as_slice(), &[0x12, 0x00, 0x01, 0x02, 0x00]);

        // Small addresses still use four address bytes
        let cmd = Command::with_address(opcodes::SE_4B, 0x10);
        assert_eq!(cmd.header().as_slice(), &[0x21, 0x00, 0x00, 0x00, 0x10]);
    }
}
