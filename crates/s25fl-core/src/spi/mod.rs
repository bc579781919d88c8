//! SPI types and command structures
//!
//! This module provides the S25FL064L opcodes and the framing of the
//! command/address header that precedes every data phase.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::{Command, MAX_HEADER_LEN};
pub use opcodes::*;
