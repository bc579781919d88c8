//! SFDP type definitions
//!
//! Types representing the SFDP structures as defined by JEDEC JESD216.

/// SFDP signature magic value ("SFDP" in little-endian)
pub const SFDP_SIGNATURE: u32 = 0x50444653;

/// Number of parameter headers kept in [`FlashParams`]
pub const PARAMETER_HEADERS: usize = 2;

/// Size of the raw descriptor block read during initialization
pub const FLASH_PARAMS_LEN: usize = 8 + 8 * PARAMETER_HEADERS;

/// Basic Flash Parameter Table ID
pub const PARAM_ID_BASIC: u16 = 0xFF00;
/// Sector Map Parameter Table ID
pub const PARAM_ID_SECTOR_MAP: u16 = 0xFF81;

/// SFDP revision information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SfdpRevision {
    /// Major revision number
    pub major: u8,
    /// Minor revision number
    pub minor: u8,
}

impl core::fmt::Display for SfdpRevision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// SFDP header structure (first 8 bytes at address 0x00)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SfdpHeader {
    /// SFDP signature (should be [`SFDP_SIGNATURE`])
    pub signature: u32,
    /// SFDP revision
    pub revision: SfdpRevision,
    /// Number of parameter headers (0-based, so actual count is nph + 1)
    pub nph: u8,
    /// Access protocol (0xFF for legacy)
    pub access_protocol: u8,
}

impl SfdpHeader {
    /// Parse the SFDP header from raw little-endian bytes
    pub fn parse(data: &[u8; 8]) -> Self {
        Self {
            signature: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            revision: SfdpRevision {
                minor: data[4],
                major: data[5],
            },
            nph: data[6],
            access_protocol: data[7],
        }
    }

    /// Check if the signature reads "SFDP"
    pub fn is_valid(&self) -> bool {
        self.signature == SFDP_SIGNATURE
    }

    /// Number of parameter headers the chip advertises
    pub fn num_param_headers(&self) -> usize {
        (self.nph as usize) + 1
    }
}

/// Parameter header structure (8 bytes each, starting at address 0x08)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterHeader {
    /// Parameter ID (MSB << 8 | LSB)
    pub id: u16,
    /// Parameter table revision
    pub revision: SfdpRevision,
    /// Parameter table length in DWORDs
    pub length_dwords: u8,
    /// Parameter table pointer (24-bit byte address)
    pub table_pointer: u32,
}

impl ParameterHeader {
    /// Parse a parameter header from raw little-endian bytes
    pub fn parse(data: &[u8; 8]) -> Self {
        Self {
            id: u16::from_be_bytes([data[7], data[0]]),
            revision: SfdpRevision {
                minor: data[1],
                major: data[2],
            },
            length_dwords: data[3],
            table_pointer: u32::from_le_bytes([data[4], data[5], data[6], 0]),
        }
    }

    /// Table length in bytes
    pub fn length_bytes(&self) -> usize {
        (self.length_dwords as usize) * 4
    }

    /// Check if this is the Basic Flash Parameter Table
    pub fn is_basic(&self) -> bool {
        self.id == PARAM_ID_BASIC
    }
}

/// Descriptor block read by the driver: SFDP header plus two parameter headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashParams {
    /// SFDP header
    pub header: SfdpHeader,
    /// First and second parameter headers
    pub params: [ParameterHeader; PARAMETER_HEADERS],
}

impl FlashParams {
    /// Decode the raw 24-byte descriptor block
    pub fn parse(data: &[u8; FLASH_PARAMS_LEN]) -> Self {
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&data[..8]);
        let header = SfdpHeader::parse(&chunk);

        let mut params = [ParameterHeader::default(); PARAMETER_HEADERS];
        for (i, param) in params.iter_mut().enumerate() {
            let start = 8 + i * 8;
            chunk.copy_from_slice(&data[start..start + 8]);
            *param = ParameterHeader::parse(&chunk);
        }

        Self { header, params }
    }

    /// Check the SFDP signature
    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
    }

    /// The Basic Flash Parameter Table header, if present
    pub fn basic(&self) -> Option<&ParameterHeader> {
        self.params.iter().find(|p| p.is_basic())
    }
}
