//! Protocol implementation
//!
//! This module contains the S25FL064L command sequences: framed register
//! commands, identification, busy-waiting, erase, page programming, reads
//! and power sequencing.

mod s25fl;

pub use s25fl::*;
