//! SFDP (Serial Flash Discoverable Parameters) descriptor
//!
//! During initialization the driver reads the SFDP header and the first two
//! parameter headers of the chip (24 bytes in total, starting at SFDP
//! address 0) and keeps them on the device handle as [`FlashParams`].
//!
//! The signature is decoded but not enforced: a chip answering with a bad
//! signature still initializes, the mismatch is only logged. Use
//! [`FlashParams::is_valid`] to check it explicitly.

mod types;

pub use types::*;
