//! Address width types

/// Address width of a SPI command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    #[default]
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> usize {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u64 {
        match self {
            Self::ThreeByte => 16 * 1024 * 1024, // 16 MiB
            Self::FourByte => 1 << 32,           // 4 GiB
        }
    }

    /// Encode an address MSB first into `buf`
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        let bytes = address.to_be_bytes();
        match self {
            Self::ThreeByte => buf[..3].copy_from_slice(&bytes[1..]),
            Self::FourByte => buf[..4].copy_from_slice(&bytes),
        }
    }
}
