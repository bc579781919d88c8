//! Error types for s25fl-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate. It is generic over the transport's own error so
//! that bus failures reach the caller unchanged.

use core::fmt;

/// Core error type - no_std compatible
///
/// `E` is the error type of the [`Transport`](crate::transport::Transport)
/// the driver runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A call was made with parameters the driver cannot frame
    /// (empty or oversized command, address range past 4 GiB)
    InvalidParameter,
    /// The transport reported a failure, passed through verbatim
    Transport(E),
    /// The write enable latch did not set, the program was not attempted
    WriteProtected,
    /// The device has not completed initialization
    NotInitialized,
    /// A bounded busy-wait gave up before the chip became ready
    Timeout,
    /// The requested block range lies outside the device
    AddressOutOfBounds,
}

impl<E> Error<E> {
    /// Returns the transport error if this is a transport failure
    pub fn transport(&self) -> Option<&E> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this error came from a bounded busy-wait
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::Transport(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::Transport(e) => write!(f, "transport failure: {:?}", e),
            Self::WriteProtected => write!(f, "flash chip is write protected"),
            Self::NotInitialized => write!(f, "flash device not initialized"),
            Self::Timeout => write!(f, "flash chip busy: operation timed out"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// Result type alias using the core Error type
pub type Result<T, E> = core::result::Result<T, Error<E>>;
