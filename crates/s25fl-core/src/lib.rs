//! s25fl-core - Protocol driver for the S25FL064L SPI NOR flash
//!
//! This crate implements the command protocol of the Cypress/Infineon
//! S25FL064L serial NOR flash: command framing around chip-select, chunked
//! transfers below the bus master's single-transfer ceiling, busy-wait
//! synchronization and the page-program chunking used for arbitrary-length
//! writes. It is `no_std` and talks to the hardware only through the
//! [`Transport`](transport::Transport) capability set supplied by the caller.
//!
//! # Features
//!
//! - `std` - Enable standard library support and serde derives
//! - `is_sync` - Compile the driver as blocking code instead of `async`
//!
//! # Example
//!
//! ```ignore
//! use s25fl_core::{device::S25fl064l, transport::Transport};
//!
//! fn bring_up<T: Transport>(bus: &mut T) -> s25fl_core::Result<(), T::Error> {
//!     let mut flash = S25fl064l::new(bus);
//!     flash.initialize()?;
//!     flash.erase_sector(0)?;
//!     flash.write(0, b"hello")?;
//!     let mut buf = [0u8; 5];
//!     flash.read(0, &mut buf)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "std")]
extern crate std;

pub mod block;
pub mod device;
pub mod error;
pub mod memtest;
pub mod protocol;
pub mod register;
pub mod sfdp;
pub mod spi;
pub mod transport;

pub use error::{Error, Result};
