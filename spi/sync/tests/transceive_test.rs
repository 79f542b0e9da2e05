//! Blocking transceive tests for sharedspi-sync
//! These tests run on x86 host with std, but verify no_std compatible code

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::spi::SpiBus;
use sharedspi_core::{
    all_regions_dma_capable, CacheOps, ChipSelectPort, ContextId, DeviceId, DmaRegionFilter,
    IoStrategy, Pin, PlatformCaps, SpiConfig, SpiError, SpiPeripheral, SpiResult, TaskSync,
    TransferOutcome,
};
use sharedspi_engine::{registry, SpiDevice, TransferShared};
use sharedspi_sync::{BlockingSpi, SpiTransceiver};

fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

fn reject_all(_addr: usize, _len: usize) -> bool {
    false
}

#[derive(Default)]
struct BusStats {
    dma_starts: AtomicU32,
    blocking_transfers: AtomicU32,
    inits: AtomicU32,
}

#[derive(Default)]
struct BusBehavior {
    complete: AtomicBool,
    fault: AtomicBool,
    fail_blocking: AtomicBool,
}

/// Loopback-wired fake peripheral; receive-only operations read 0x5A
struct FakeBus {
    id: DeviceId,
    stats: &'static BusStats,
    behavior: &'static BusBehavior,
}

impl FakeBus {
    fn run(&self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) {
        if let Some(buf) = rx {
            match tx {
                Some(data) => buf.copy_from_slice(data),
                None => buf.fill(0x5A),
            }
        }
    }

    fn finish(&self) {
        if self.behavior.complete.load(Ordering::SeqCst) {
            let outcome = if self.behavior.fault.load(Ordering::SeqCst) {
                TransferOutcome::Fault
            } else {
                TransferOutcome::Done
            };
            registry::transfer_complete(self.id, outcome);
        }
    }
}

impl SpiPeripheral for FakeBus {
    fn init(&mut self, _config: &SpiConfig, _cs: Option<Pin>) -> SpiResult<()> {
        self.stats.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deinit(&mut self) {}

    fn disable(&mut self) {}

    fn poll_ready(&mut self) -> nb::Result<(), SpiError> {
        Ok(())
    }

    fn start_dma(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> SpiResult<()> {
        self.stats.dma_starts.fetch_add(1, Ordering::SeqCst);
        self.run(tx, rx);
        self.finish();
        Ok(())
    }

    fn start_interrupt(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> SpiResult<()> {
        self.run(tx, rx);
        self.finish();
        Ok(())
    }

    fn transfer_blocking(
        &mut self,
        tx: Option<&[u8]>,
        rx: Option<&mut [u8]>,
        _timeout_ms: u32,
    ) -> SpiResult<()> {
        self.stats.blocking_transfers.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_blocking.load(Ordering::SeqCst) {
            return Err(SpiError::Vendor(-1));
        }
        self.run(tx, rx);
        Ok(())
    }

    fn abort(&mut self) {}

    fn stop_dma(&mut self) {}

    fn drain_receive(&mut self) {}
}

#[derive(Default)]
struct FakeSync {
    signaled: AtomicBool,
}

impl TaskSync for FakeSync {
    fn current_context(&self) -> ContextId {
        ContextId::new(3)
    }

    fn block_current(&self, _timeout_ms: u32) -> bool {
        self.signaled.swap(false, Ordering::SeqCst)
    }

    fn signal(&self, _ctx: ContextId) {
        self.signaled.store(true, Ordering::SeqCst);
    }

    fn delay_ms(&self, _ms: u32) {}
}

/// Chip-select port recording every transition and the current level
#[derive(Default)]
struct FakePort {
    asserts: AtomicU32,
    deasserts: AtomicU32,
    low: AtomicBool,
}

impl ChipSelectPort for FakePort {
    fn assert(&self, _pin: Pin) {
        self.asserts.fetch_add(1, Ordering::SeqCst);
        self.low.store(true, Ordering::SeqCst);
    }

    fn deassert(&self, _pin: Pin) {
        self.deasserts.fetch_add(1, Ordering::SeqCst);
        self.low.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CacheStats {
    flush_sends: AtomicU32,
    flush_receives: AtomicU32,
    invalidates: AtomicU32,
}

struct CountingCache {
    stats: &'static CacheStats,
}

impl CacheOps for CountingCache {
    fn flush_before_send(&mut self, _buf: &[u8]) {
        self.stats.flush_sends.fetch_add(1, Ordering::SeqCst);
    }

    fn flush_before_receive(&mut self, _buf: &[u8]) {
        self.stats.flush_receives.fetch_add(1, Ordering::SeqCst);
    }

    fn invalidate_after_receive(&mut self, _buf: &mut [u8]) {
        self.stats.invalidates.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    spi: SpiTransceiver<FakeBus, CountingCache>,
    stats: &'static BusStats,
    behavior: &'static BusBehavior,
    port: &'static FakePort,
    cache: &'static CacheStats,
}

fn fixture(id: u8, strategy: IoStrategy, caps: PlatformCaps, filter: DmaRegionFilter) -> Fixture {
    let stats = leak(BusStats::default());
    let behavior = leak(BusBehavior::default());
    behavior.complete.store(true, Ordering::SeqCst);
    let sync = leak(FakeSync::default());
    let port = leak(FakePort::default());
    let cache = leak(CacheStats::default());
    let shared = leak(TransferShared::new());
    let id = DeviceId::new(id);
    let bus = FakeBus {
        id,
        stats,
        behavior,
    };
    let dev = SpiDevice::new(
        id,
        bus,
        CountingCache { stats: cache },
        strategy,
        caps,
        filter,
        sync,
        port,
        shared,
    );
    dev.attach().unwrap();
    let mut spi = SpiTransceiver::new(dev);
    spi.configure(&SpiConfig::default(), None).unwrap();
    Fixture {
        spi,
        stats,
        behavior,
        port,
        cache,
    }
}

fn full_caps() -> PlatformCaps {
    PlatformCaps::new(true, true, true)
}

#[test]
fn test_loopback_transceive_returns_data() {
    let mut f = fixture(0, IoStrategy::Dma, full_caps(), all_regions_dma_capable);

    let tx = [0xAAu8, 0x55];
    let mut rx = [0u8; 2];
    f.spi
        .transceive(Some(&tx), Some(&mut rx), Some(Pin::new(4)), 50)
        .unwrap();

    assert_eq!(rx, [0xAA, 0x55]);
    assert!(!f.spi.is_busy());
    assert_eq!(f.port.asserts.load(Ordering::SeqCst), 1);
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 1);
    assert!(!f.port.low.load(Ordering::SeqCst));
    // DMA discipline: flushes before, invalidate after the receive
    assert_eq!(f.cache.flush_sends.load(Ordering::SeqCst), 1);
    assert_eq!(f.cache.flush_receives.load(Ordering::SeqCst), 1);
    assert_eq!(f.cache.invalidates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_timeout_leaves_device_idle_and_reusable() {
    let mut f = fixture(
        1,
        IoStrategy::Dma,
        PlatformCaps::new(false, false, true),
        all_regions_dma_capable,
    );
    f.behavior.complete.store(false, Ordering::SeqCst);

    let tx = [1u8, 2];
    let mut rx = [0u8; 2];
    let result = f
        .spi
        .transceive(Some(&tx), Some(&mut rx), Some(Pin::new(9)), 1);
    assert_eq!(result, Err(SpiError::Timeout));
    assert!(!f.spi.is_busy());
    assert_eq!(f.port.asserts.load(Ordering::SeqCst), 1);
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 1);
    assert!(!f.port.low.load(Ordering::SeqCst));
    // No clean abort on this platform: recovery reinitialized the peripheral
    assert_eq!(f.stats.inits.load(Ordering::SeqCst), 2);

    // After a timeout the device must be immediately reusable
    f.behavior.complete.store(true, Ordering::SeqCst);
    f.spi
        .transceive(Some(&tx), Some(&mut rx), Some(Pin::new(9)), 50)
        .unwrap();
    assert_eq!(rx, tx);
    assert_eq!(f.port.asserts.load(Ordering::SeqCst), 2);
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_transmit_only_and_receive_only() {
    let mut f = fixture(2, IoStrategy::Polled, full_caps(), all_regions_dma_capable);

    let tx = [9u8, 8, 7];
    f.spi.transceive(Some(&tx), None, None, 50).unwrap();

    let mut rx = [0u8; 3];
    f.spi.transceive(None, Some(&mut rx), None, 50).unwrap();
    assert_eq!(rx, [0x5A; 3]);
    assert_eq!(f.stats.blocking_transfers.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rejects_invalid_request_before_selecting() {
    let mut f = fixture(3, IoStrategy::Polled, full_caps(), all_regions_dma_capable);

    let result = f.spi.transceive(None, None, Some(Pin::new(2)), 50);
    assert_eq!(result, Err(SpiError::InvalidParameter));
    // CS must not have moved
    assert_eq!(f.port.asserts.load(Ordering::SeqCst), 0);
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_polled_fallback_matches_dma_results() {
    let mut dma = fixture(4, IoStrategy::Dma, full_caps(), all_regions_dma_capable);
    let mut fallback = fixture(5, IoStrategy::Dma, full_caps(), reject_all);

    let tx = [0xDEu8, 0xAD, 0xBE, 0xEF];
    let mut via_dma = [0u8; 4];
    let mut via_polled = [0u8; 4];

    dma.spi
        .transceive(Some(&tx), Some(&mut via_dma), None, 50)
        .unwrap();
    fallback
        .spi
        .transceive(Some(&tx), Some(&mut via_polled), None, 50)
        .unwrap();

    assert_eq!(via_dma, via_polled);
    assert_eq!(dma.stats.dma_starts.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.stats.dma_starts.load(Ordering::SeqCst), 0);
    assert_eq!(fallback.stats.blocking_transfers.load(Ordering::SeqCst), 1);
    // Cache maintenance belongs to the DMA path only
    assert_eq!(dma.cache.invalidates.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.cache.invalidates.load(Ordering::SeqCst), 0);
}

#[test]
fn test_completion_fault_surfaces_hardware_error() {
    let mut f = fixture(6, IoStrategy::Dma, full_caps(), all_regions_dma_capable);
    f.behavior.fault.store(true, Ordering::SeqCst);

    let tx = [1u8];
    let result = f.spi.transceive(Some(&tx), None, Some(Pin::new(1)), 50);
    assert_eq!(result, Err(SpiError::Hardware));
    assert!(!f.spi.is_busy());
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 1);
    assert!(!f.port.low.load(Ordering::SeqCst));
}

#[test]
fn test_start_failure_releases_chip_select() {
    let mut f = fixture(7, IoStrategy::Polled, full_caps(), all_regions_dma_capable);
    f.behavior.fail_blocking.store(true, Ordering::SeqCst);

    let tx = [1u8, 2];
    let result = f.spi.transceive(Some(&tx), None, Some(Pin::new(5)), 50);
    assert_eq!(result, Err(SpiError::Vendor(-1)));
    assert!(!f.spi.is_busy());
    assert_eq!(f.port.asserts.load(Ordering::SeqCst), 1);
    assert_eq!(f.port.deasserts.load(Ordering::SeqCst), 1);
    assert!(!f.port.low.load(Ordering::SeqCst));
}

#[test]
fn test_disable_and_flush_leaves_device_unconfigured() {
    let mut f = fixture(8, IoStrategy::Polled, full_caps(), all_regions_dma_capable);
    f.spi.disable_and_flush();

    let tx = [1u8];
    assert_eq!(
        f.spi.transceive(Some(&tx), None, None, 50),
        Err(SpiError::NotConfigured)
    );
}

#[test]
fn test_timeout_still_invalidates_dma_receive() {
    let mut f = fixture(10, IoStrategy::Dma, full_caps(), all_regions_dma_capable);
    // The DMA writes into rx and then stalls without completing
    f.behavior.complete.store(false, Ordering::SeqCst);

    let tx = [0x11u8, 0x22];
    let mut rx = [0u8; 2];
    let result = f.spi.transceive(Some(&tx), Some(&mut rx), None, 1);
    assert_eq!(result, Err(SpiError::Timeout));
    // The controller may have touched any part of rx before the abort;
    // the cached lines must be dropped even on the timeout exit
    assert_eq!(f.cache.invalidates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_ehal_bus_adapter_roundtrip() {
    let mut f = fixture(9, IoStrategy::Polled, full_caps(), all_regions_dma_capable);
    let mut bus = BlockingSpi::new(&mut f.spi, 50);

    bus.write(&[1, 2, 3]).unwrap();

    let mut rx = [0u8; 2];
    bus.read(&mut rx).unwrap();
    assert_eq!(rx, [0x5A, 0x5A]);

    // Unequal lengths: common prefix full duplex, remainder write-only
    let mut read = [0u8; 2];
    bus.transfer(&mut read, &[7, 8, 9, 10]).unwrap();
    assert_eq!(read, [7, 8]);

    let mut words = [0xA1u8, 0xB2, 0xC3];
    bus.transfer_in_place(&mut words).unwrap();
    assert_eq!(words, [0xA1, 0xB2, 0xC3]);

    bus.flush().unwrap();
}
