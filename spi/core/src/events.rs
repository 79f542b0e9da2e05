//! Completion events crossing the interrupt/task boundary

/// Identity of one physical SPI peripheral instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(u8);

impl DeviceId {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "spi{=u8}", self.0);
    }
}

/// How a transfer finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The hardware completed the full transfer
    Done,
    /// The peripheral reported an error condition
    Fault,
}

/// Completion event posted by the engine's interrupt-context handler
///
/// Delivered through a single-slot channel per device; the synchronous
/// façade's blocking wait is a receive-with-timeout on that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub device: DeviceId,
    pub outcome: TransferOutcome,
}
