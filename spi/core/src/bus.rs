//! Vendor peripheral primitives

use crate::{Pin, SpiConfig, SpiError, SpiResult};

/// Platform capability flags for one SPI peripheral instance
///
/// These replace conditional compilation on the device family: the engine
/// selects abort and dispatch behavior from the flags at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCaps {
    /// The peripheral supports aborting an in-flight transfer without
    /// leaving residual data latched in its output FIFO. Where this is
    /// false the engine recovers by disabling and reinitializing instead.
    pub clean_abort: bool,
    /// Interrupt-driven transfers are wired up for this instance
    pub interrupt_capable: bool,
    /// DMA streams are wired up for this instance
    pub dma_capable: bool,
}

impl PlatformCaps {
    pub const fn new(clean_abort: bool, interrupt_capable: bool, dma_capable: bool) -> Self {
        Self {
            clean_abort,
            interrupt_capable,
            dma_capable,
        }
    }
}

/// Vendor SPI peripheral driver
///
/// The register-level driver supplied by the platform port. The non-blocking
/// start calls hand the transfer to hardware and return immediately; the
/// implementation must report completion through the engine's registry
/// (`transfer_complete`) from its interrupt or DMA completion handler, and
/// must not retain the buffers past that notification.
///
/// A `tx` of `None` means receive-only, an `rx` of `None` transmit-only.
pub trait SpiPeripheral {
    /// Initialize the peripheral with the given configuration
    fn init(&mut self, config: &SpiConfig, cs: Option<Pin>) -> SpiResult<()>;

    /// Tear the peripheral down; the inverse of [`init`](Self::init)
    fn deinit(&mut self);

    /// Drop the peripheral enable line without a full teardown
    fn disable(&mut self);

    /// Query readiness; `WouldBlock` means the peripheral or one of its DMA
    /// channels is still occupied by a previous operation
    fn poll_ready(&mut self) -> nb::Result<(), SpiError>;

    /// Start a DMA transfer (non-blocking)
    fn start_dma(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> SpiResult<()>;

    /// Start an interrupt-driven transfer (non-blocking)
    fn start_interrupt(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> SpiResult<()>;

    /// Execute a transfer with the CPU, blocking up to `timeout_ms`
    fn transfer_blocking(
        &mut self,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        timeout_ms: u32,
    ) -> SpiResult<()>;

    /// Abort an in-flight transfer in place (only meaningful where
    /// [`PlatformCaps::clean_abort`] is set)
    fn abort(&mut self);

    /// Stop the DMA streams attached to this peripheral
    fn stop_dma(&mut self);

    /// Read and discard residual bytes from the receive FIFO
    fn drain_receive(&mut self);
}
