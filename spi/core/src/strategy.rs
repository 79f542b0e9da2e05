//! Transfer strategy selection and DMA eligibility

/// Hardware mechanism used to execute one transfer
///
/// The strategy is a fixed property of a device instance, chosen when the
/// instance is constructed. A DMA device falls back to polled transfer for
/// any operation whose buffers the DMA controller cannot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStrategy {
    /// DMA-driven transfer; lowest CPU overhead for large operations
    Dma,
    /// Interrupt-driven transfer; can reach all memory areas
    Interrupt,
    /// Blocking transfer driven by the CPU; the universal fallback
    Polled,
}

#[cfg(feature = "defmt")]
impl defmt::Format for IoStrategy {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Dma => defmt::write!(fmt, "Dma"),
            Self::Interrupt => defmt::write!(fmt, "Interrupt"),
            Self::Polled => defmt::write!(fmt, "Polled"),
        }
    }
}

/// Outcome of the per-transfer eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyDecision {
    /// The configured strategy is usable for this transfer
    Use(IoStrategy),
    /// The configured strategy is not eligible; use this one instead
    Fallback(IoStrategy),
}

impl StrategyDecision {
    /// The strategy that will actually execute the transfer
    pub const fn applied(self) -> IoStrategy {
        match self {
            Self::Use(s) | Self::Fallback(s) => s,
        }
    }
}

/// Address-range predicate deciding whether the DMA controller can reach a
/// buffer. Supplied per platform; some on-chip RAM regions are not
/// DMA-visible (CCM RAM, cached regions without maintenance).
pub type DmaRegionFilter = fn(addr: usize, len: usize) -> bool;

/// A region filter for platforms where every address is DMA-visible
pub fn all_regions_dma_capable(_addr: usize, _len: usize) -> bool {
    true
}

fn buffer_eligible(buf: Option<&[u8]>, filter: DmaRegionFilter) -> bool {
    // An absent buffer never participates in the DMA operation
    buf.map_or(true, |b| filter(b.as_ptr() as usize, b.len()))
}

/// Resolve the strategy for one transfer
///
/// DMA is eligible only when every participating buffer passes the region
/// filter; otherwise the transfer falls back to polled I/O. Interrupt and
/// polled strategies are always eligible.
pub fn decide(
    configured: IoStrategy,
    tx: Option<&[u8]>,
    rx: Option<&[u8]>,
    filter: DmaRegionFilter,
) -> StrategyDecision {
    match configured {
        IoStrategy::Dma if buffer_eligible(tx, filter) && buffer_eligible(rx, filter) => {
            StrategyDecision::Use(IoStrategy::Dma)
        }
        IoStrategy::Dma => StrategyDecision::Fallback(IoStrategy::Polled),
        other => StrategyDecision::Use(other),
    }
}
