//! SPI configuration snapshot

/// SPI clock mode (clock polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

/// Bus role of the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// The peripheral drives the clock
    Master,
}

/// SPI configuration snapshot
///
/// The engine caches the last applied snapshot and compares it against new
/// requests; an unchanged snapshot skips the peripheral teardown/reinit,
/// which is expensive and can glitch the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub device_mode: DeviceMode,
    /// Word size in bits
    pub word_size: u8,
    pub clock_mode: ClockMode,
    /// Bit rate in Hz
    pub bit_rate: u32,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            device_mode: DeviceMode::Master,
            word_size: 8,
            clock_mode: ClockMode::Mode0,
            bit_rate: 1_000_000, // 1 MHz
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "SpiConfig {{ {=u8} bits, {=u32} Hz }}",
            self.word_size,
            self.bit_rate
        );
    }
}
