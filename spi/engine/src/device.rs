//! Per-peripheral device state machine and strategy dispatch

use heapless::Deque;
use sharedspi_core::{
    decide, validate_request, CacheOps, ChipSelectPort, DeviceId, DmaRegionFilter, IoStrategy,
    Pin, PlatformCaps, SpiConfig, SpiError, SpiPeripheral, SpiResult, TaskSync, TransferOutcome,
};

use crate::{registry, TransferShared, NOT_READY_SETTLE_MS, POLLED_TIMEOUT_MS};

/// Depth of the per-device soft-fault log
pub const FAULT_LOG_DEPTH: usize = 4;

/// One physical SPI peripheral instance
///
/// Exclusively owned by the subsystem that registers it; the interrupt-side
/// completion path reaches only the [`TransferShared`] state through the
/// registry. The transfer strategy is fixed at construction - a DMA device
/// falls back to polled I/O per transfer when a buffer is not DMA-visible,
/// but the configured strategy itself never changes at runtime.
pub struct SpiDevice<B: SpiPeripheral, C: CacheOps> {
    id: DeviceId,
    bus: B,
    cache: C,
    strategy: IoStrategy,
    caps: PlatformCaps,
    dma_filter: DmaRegionFilter,
    sync: &'static dyn TaskSync,
    cs_port: &'static dyn ChipSelectPort,
    shared: &'static TransferShared,
    cached: Option<SpiConfig>,
    cs_default: Option<Pin>,
    init_complete: bool,
    last_used: Option<IoStrategy>,
    faults: Deque<SpiError, FAULT_LOG_DEPTH>,
}

impl<B: SpiPeripheral, C: CacheOps> SpiDevice<B, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DeviceId,
        bus: B,
        cache: C,
        strategy: IoStrategy,
        caps: PlatformCaps,
        dma_filter: DmaRegionFilter,
        sync: &'static dyn TaskSync,
        cs_port: &'static dyn ChipSelectPort,
        shared: &'static TransferShared,
    ) -> Self {
        Self {
            id,
            bus,
            cache,
            strategy,
            caps,
            dma_filter,
            sync,
            cs_port,
            shared,
            cached: None,
            cs_default: None,
            init_complete: false,
            last_used: None,
            faults: Deque::new(),
        }
    }

    /// Make this device reachable by the interrupt-context completion path
    pub fn attach(&self) -> SpiResult<()> {
        registry::attach_device(self.id, self.shared, self.cs_port, self.sync)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn strategy(&self) -> IoStrategy {
        self.strategy
    }

    /// Strategy actually used by the most recent transfer (fallback-aware)
    pub fn last_strategy(&self) -> Option<IoStrategy> {
        self.last_used
    }

    pub fn is_busy(&self) -> bool {
        self.shared.is_active()
    }

    /// Apply a configuration snapshot
    ///
    /// A snapshot identical to the cached one on an initialized device is a
    /// no-op; a peripheral reset is expensive and can glitch the bus.
    /// Otherwise any active DMA is stopped and the peripheral is torn down
    /// and reinitialized. Idempotent under repeated identical calls.
    pub fn configure(&mut self, config: &SpiConfig, cs: Option<Pin>) -> SpiResult<()> {
        if self.init_complete && self.cached == Some(*config) {
            return Ok(());
        }
        if self.init_complete {
            if self.strategy == IoStrategy::Dma {
                self.bus.stop_dma();
            }
            self.bus.deinit();
        }
        self.bus.init(config, cs)?;
        self.init_complete = true;
        self.shared.set_active(false);
        self.cached = Some(*config);
        self.cs_default = cs;
        Ok(())
    }

    /// Start a transfer using the device's strategy
    ///
    /// Marks the device busy and hands the buffers to hardware. Completion
    /// arrives through [`registry::transfer_complete`]: from interrupt
    /// context for DMA and interrupt transfers, synthesized synchronously
    /// for polled ones. If the primitive itself fails the error is returned
    /// and the device stays busy until [`stop_transfer`](Self::stop_transfer)
    /// runs, so every recovery funnels through the same path.
    pub fn start_transfer(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> SpiResult<()> {
        if !self.init_complete {
            return Err(SpiError::NotConfigured);
        }
        validate_request(tx, rx.as_deref())?;
        match self.strategy {
            IoStrategy::Interrupt if !self.caps.interrupt_capable => {
                return Err(SpiError::InvalidIoStrategy)
            }
            IoStrategy::Dma if !self.caps.dma_capable => return Err(SpiError::InvalidIoStrategy),
            _ => {}
        }

        let decision = decide(self.strategy, tx, rx.as_deref(), self.dma_filter);
        let used = decision.applied();
        self.last_used = Some(used);
        self.shared.set_active(true);

        let result = match used {
            IoStrategy::Dma => {
                self.settle_if_not_ready();
                if let Some(buf) = tx {
                    self.cache.flush_before_send(buf);
                }
                if let Some(buf) = rx.as_deref() {
                    self.cache.flush_before_receive(buf);
                }
                self.bus.start_dma(tx, rx)
            }
            IoStrategy::Interrupt => {
                self.settle_if_not_ready();
                self.bus.start_interrupt(tx, rx)
            }
            IoStrategy::Polled => {
                let result = self.bus.transfer_blocking(tx, rx, POLLED_TIMEOUT_MS);
                if result.is_ok() {
                    // No asynchronous completion will arrive; feed the same
                    // completion path the interrupt handlers use
                    registry::transfer_complete(self.id, TransferOutcome::Done);
                }
                result
            }
        };
        if let Err(err) = result {
            self.record_fault(err);
            #[cfg(feature = "defmt")]
            defmt::warn!("spi{=u8}: transfer start failed: {}", self.id.raw(), err);
        }
        result
    }

    /// Abort an in-flight transfer and return the peripheral to a known state
    ///
    /// Safe to call whether or not a transfer is active. Where the hardware
    /// aborts cleanly, the transfer is stopped in place; otherwise residual
    /// data would stay latched in the output FIFO and be clocked out on the
    /// next operation, so the peripheral is fully disabled and reinitialized
    /// with the cached configuration instead. The enable line is dropped in
    /// both cases.
    pub fn stop_transfer(&mut self) {
        if !self.init_complete {
            return;
        }
        if self.shared.is_active() {
            if self.caps.clean_abort {
                self.bus.abort();
                self.shared.set_active(false);
            } else {
                let config = self.cached;
                let cs = self.cs_default;
                self.disable();
                if let Some(config) = config {
                    if self.configure(&config, cs).is_err() {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("spi{=u8}: reinit after abort failed", self.id.raw());
                    }
                }
            }
        }
        self.bus.disable();
    }

    /// Disable the device and flush any data from the FIFOs
    pub fn disable(&mut self) {
        if self.init_complete {
            if self.strategy == IoStrategy::Dma {
                self.bus.stop_dma();
            }
            self.bus.drain_receive();
            self.bus.deinit();
            self.init_complete = false;
            self.shared.set_active(false);
        }
    }

    /// Drain residual received bytes without storing them
    ///
    /// Used after configuration changes or aborted transfers so stale bytes
    /// cannot corrupt the next operation.
    pub fn flush_receive(&mut self) {
        self.bus.drain_receive();
    }

    /// Pop the oldest recorded soft fault, if any
    pub fn take_fault(&mut self) -> Option<SpiError> {
        self.faults.pop_front()
    }

    /// Assert a chip-select pin and arm it for release on completion
    pub fn select(&mut self, cs: Option<Pin>) {
        if let Some(pin) = cs {
            self.cs_port.assert(pin);
            self.shared.select(pin);
        }
    }

    /// Deassert the armed chip-select pin if completion has not already
    pub fn release_select(&mut self) {
        if let Some(pin) = self.shared.take_selected() {
            self.cs_port.deassert(pin);
        }
    }

    /// Record the calling context as the one to signal on completion
    pub fn record_waiter(&self) {
        self.shared.set_waiter(self.sync.current_context());
    }

    pub fn clear_waiter(&self) {
        self.shared.clear_waiter();
    }

    /// Block the calling context until signaled; `false` on timeout
    pub fn block_until_signal(&self, timeout_ms: u32) -> bool {
        self.sync.block_current(timeout_ms)
    }

    /// Receive side of the per-device completion channel
    pub fn take_completion(&self) -> Option<sharedspi_core::Completion> {
        self.shared.take_completion()
    }

    /// Drop cached lines over a DMA-written receive buffer
    pub fn invalidate_after_receive(&mut self, buf: &mut [u8]) {
        self.cache.invalidate_after_receive(buf);
    }

    // Wait-and-proceed on not-ready hardware: the request goes out after a
    // fixed settle delay without re-checking readiness. Known limitation,
    // kept observable through the fault log.
    fn settle_if_not_ready(&mut self) {
        match self.bus.poll_ready() {
            Ok(()) => {}
            Err(nb::Error::WouldBlock) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "spi{=u8}: not ready, proceeding after settle",
                    self.id.raw()
                );
                self.record_fault(SpiError::HardwareNotReady);
                self.sync.delay_ms(NOT_READY_SETTLE_MS);
            }
            Err(nb::Error::Other(err)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("spi{=u8}: readiness fault: {}", self.id.raw(), err);
                self.record_fault(err);
                self.sync.delay_ms(NOT_READY_SETTLE_MS);
            }
        }
    }

    fn record_fault(&mut self, err: SpiError) {
        if self.faults.is_full() {
            self.faults.pop_front();
        }
        let _ = self.faults.push_back(err);
    }
}
