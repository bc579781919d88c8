//! Transport trait definitions
//!
//! The driver never touches the bus peripheral or GPIOs itself. Everything
//! it needs from the platform is collected in the [`Transport`] trait, which
//! the caller implements and lends to the device handle.
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy or other executors)
//! - With the `is_sync` feature, traits become synchronous

use maybe_async::maybe_async;

/// Largest single bus transfer of the reference bus master (nRF52 SPI master)
pub const DEFAULT_MAX_TRANSFER_LEN: usize = 255;

/// Bus capabilities used by the driver (sync or async depending on `is_sync`)
///
/// ## Transfer framing
///
/// [`transfer`](Transport::transfer) is full duplex. The bus clocks
/// `max(tx.len(), rx.len())` bytes; `rx[i]` receives the byte shifted in
/// during clock byte `i`, and bytes past the end of `tx` are clocked out as
/// `0x00`. A status read therefore sends one opcode byte, receives two bytes
/// and keeps the second one.
///
/// Chip-select is driven separately through [`select`](Transport::select),
/// so one select window may span several transfers.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async]
/// impl Transport for Board {
///     type Error = SpimError;
///
///     fn reset(&mut self) {
///         self.reset_pin.set_low();
///         self.delay.delay_ms(1);
///         self.reset_pin.set_high();
///     }
///
///     fn select(&mut self, select: bool) {
///         if select { self.cs.set_low() } else { self.cs.set_high() }
///     }
///
///     async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SpimError> {
///         self.spim.transfer_split(rx, tx).await
///     }
///
///     fn on_busy(&mut self) {
///         self.watchdog.feed();
///     }
/// }
/// ```
#[maybe_async(AFIT)]
pub trait Transport {
    /// Error reported by a failed transfer
    type Error: core::fmt::Debug;

    /// Pulse the hardware reset line of the chip
    fn reset(&mut self);

    /// Assert (`true`) or release (`false`) chip-select
    fn select(&mut self, select: bool);

    /// Perform one full-duplex transfer inside the current select window
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;

    /// Called once per status poll that still reports the chip busy
    ///
    /// Typically used to feed a watchdog during long erase operations.
    fn on_busy(&mut self) {}

    /// Maximum number of bytes a single [`transfer`](Transport::transfer)
    /// may move in either direction
    fn max_transfer_len(&self) -> usize {
        DEFAULT_MAX_TRANSFER_LEN
    }
}
