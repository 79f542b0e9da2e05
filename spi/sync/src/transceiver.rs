//! Blocking transceive over the transfer engine

use sharedspi_core::{
    validate_request, CacheOps, IoStrategy, Pin, SpiConfig, SpiError, SpiPeripheral, SpiResult,
    TransferOutcome,
};
use sharedspi_engine::SpiDevice;

/// Synchronous transceive facade
///
/// Per call the state machine is: assert chip-select, start the engine
/// transfer, block the calling context until the completion handler signals
/// it or the timeout elapses, then deassert chip-select and return. On
/// timeout the engine is force-aborted so the device is left idle and
/// reusable; a timeout is reported, never fatal.
pub struct SpiTransceiver<B: SpiPeripheral, C: CacheOps> {
    dev: SpiDevice<B, C>,
}

impl<B: SpiPeripheral, C: CacheOps> SpiTransceiver<B, C> {
    pub fn new(dev: SpiDevice<B, C>) -> Self {
        Self { dev }
    }

    pub fn device(&self) -> &SpiDevice<B, C> {
        &self.dev
    }

    pub fn device_mut(&mut self) -> &mut SpiDevice<B, C> {
        &mut self.dev
    }

    /// Apply a configuration snapshot; no-op when unchanged
    pub fn configure(&mut self, config: &SpiConfig, cs: Option<Pin>) -> SpiResult<()> {
        self.dev.configure(config, cs)
    }

    pub fn is_busy(&self) -> bool {
        self.dev.is_busy()
    }

    /// Disable the peripheral and drain its receive FIFO
    pub fn disable_and_flush(&mut self) {
        self.dev.disable();
        self.dev.flush_receive();
    }

    /// Execute one transfer, blocking until completion or `timeout_ms`
    ///
    /// One of `tx`/`rx` may be absent (transmit-only or receive-only) but
    /// not both. When a chip-select pin is given it transitions low exactly
    /// once before the transfer and high exactly once on every exit path,
    /// timeout included. After a DMA receive the cache over `rx` is
    /// invalidated before the buffer is handed back to the caller.
    pub fn transceive(
        &mut self,
        tx: Option<&[u8]>,
        mut rx: Option<&mut [u8]>,
        cs: Option<Pin>,
        timeout_ms: u32,
    ) -> SpiResult<()> {
        // Validate before touching the chip-select line
        validate_request(tx, rx.as_deref())?;

        self.dev.select(cs);
        self.dev.record_waiter();

        if let Err(err) = self.dev.start_transfer(tx, rx.as_deref_mut()) {
            self.dev.stop_transfer();
            self.dev.clear_waiter();
            self.dev.release_select();
            let _ = self.dev.take_completion();
            return Err(err);
        }

        // The loop absorbs spurious wakeups: a signal only counts once the
        // busy flag is down
        while self.dev.is_busy() {
            if !self.dev.block_until_signal(timeout_ms) {
                break;
            }
        }

        let mut status = Ok(());
        if self.dev.is_busy() {
            #[cfg(feature = "defmt")]
            defmt::warn!("spi{=u8}: transceive timeout", self.dev.id().raw());
            self.dev.stop_transfer();
            let _ = self.dev.take_completion();
            status = Err(SpiError::Timeout);
        } else if let Some(completion) = self.dev.take_completion() {
            if completion.outcome == TransferOutcome::Fault {
                status = Err(SpiError::Hardware);
            }
        }

        // An aborted DMA may have partially written rx; drop the cached
        // lines on every exit path or the caller reads pre-transfer data
        if self.dev.last_strategy() == Some(IoStrategy::Dma) {
            if let Some(buf) = rx.as_deref_mut() {
                self.dev.invalidate_after_receive(buf);
            }
        }

        self.dev.clear_waiter();
        self.dev.release_select();
        status
    }
}
