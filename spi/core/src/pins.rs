//! Chip-select pin handling

/// GPIO pin identifier
///
/// Pins are addressed by number rather than by owned pin objects because the
/// chip-select line is toggled from both task and interrupt context; the
/// [`ChipSelectPort`] implementation owns the actual GPIO access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin(u8);

impl Pin {
    pub const fn new(pin: u8) -> Self {
        Self(pin)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Pin {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "P{=u8}", self.0);
    }
}

/// Chip-select port abstraction
///
/// Both methods must be interrupt-safe: the engine deasserts the pin from
/// the completion handler so that CS is released as close to the end of the
/// transfer as possible (some attached devices are sensitive to the
/// CS-to-clock gap).
pub trait ChipSelectPort: Sync {
    /// Drive the pin low, addressing the attached device
    fn assert(&self, pin: Pin);

    /// Drive the pin high, releasing the attached device
    fn deassert(&self, pin: Pin);
}

/// Port for buses whose devices are selected by other means
pub struct NoChipSelect;

impl ChipSelectPort for NoChipSelect {
    fn assert(&self, _pin: Pin) {}
    fn deassert(&self, _pin: Pin) {}
}
