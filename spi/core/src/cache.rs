//! Cache-maintenance service

/// CPU cache maintenance around DMA transfers
///
/// Required whenever a bus-mastering controller touches memory the CPU may
/// have cached: written data must be flushed out before the controller reads
/// it, and cached lines over a receive buffer must be dropped before the CPU
/// reads what the controller wrote.
pub trait CacheOps {
    /// Write back dirty lines covering an outbound buffer
    fn flush_before_send(&mut self, buf: &[u8]);

    /// Prepare the lines covering an inbound buffer for a DMA write
    fn flush_before_receive(&mut self, buf: &[u8]);

    /// Drop cached lines over an inbound buffer after the DMA write
    fn invalidate_after_receive(&mut self, buf: &mut [u8]);
}

/// Cache service for cores without a data cache
pub struct NoCache;

impl CacheOps for NoCache {
    fn flush_before_send(&mut self, _buf: &[u8]) {}
    fn flush_before_receive(&mut self, _buf: &[u8]) {}
    fn invalidate_after_receive(&mut self, _buf: &mut [u8]) {}
}
