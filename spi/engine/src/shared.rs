//! Per-device state shared with interrupt context

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use sharedspi_core::{Completion, ContextId, Pin};

/// Transfer state shared between the calling task and the completion handler
///
/// This is the only data the interrupt-context completion path may touch:
/// the busy flag, the waiting context, the armed chip-select pin and the
/// single-slot completion channel. Everything else on a device is owned
/// exclusively by the calling task.
pub struct TransferShared {
    active: AtomicBool,
    waiter: Mutex<Cell<Option<ContextId>>>,
    selected: Mutex<Cell<Option<Pin>>>,
    completion: Mutex<Cell<Option<Completion>>>,
}

impl TransferShared {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            waiter: Mutex::new(Cell::new(None)),
            selected: Mutex::new(Cell::new(None)),
            completion: Mutex::new(Cell::new(None)),
        }
    }

    /// Busy flag: at most one transfer request is in flight per device
    pub fn set_active(&self, on: bool) {
        self.active.store(on, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Record the context to signal on completion
    pub fn set_waiter(&self, ctx: ContextId) {
        critical_section::with(|cs| self.waiter.borrow(cs).set(Some(ctx)));
    }

    pub fn clear_waiter(&self) {
        critical_section::with(|cs| self.waiter.borrow(cs).set(None));
    }

    pub fn waiter(&self) -> Option<ContextId> {
        critical_section::with(|cs| self.waiter.borrow(cs).get())
    }

    /// Arm the chip-select pin for release by the completion handler
    pub fn select(&self, pin: Pin) {
        critical_section::with(|cs| self.selected.borrow(cs).set(Some(pin)));
    }

    /// Take the armed pin; whoever takes it deasserts it, exactly once
    pub fn take_selected(&self) -> Option<Pin> {
        critical_section::with(|cs| self.selected.borrow(cs).take())
    }

    /// Post a completion event into the single-slot channel
    ///
    /// The slot holds at most one event; with the busy flag enforcing a
    /// single request in flight, an occupied slot can only hold a stale
    /// event from an aborted transfer, which the new event replaces.
    pub fn post(&self, completion: Completion) {
        critical_section::with(|cs| self.completion.borrow(cs).set(Some(completion)));
    }

    /// Receive side of the channel
    pub fn take_completion(&self) -> Option<Completion> {
        critical_section::with(|cs| self.completion.borrow(cs).take())
    }
}

impl Default for TransferShared {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharedspi_core::{DeviceId, TransferOutcome};

    #[test]
    fn test_busy_flag() {
        let shared = TransferShared::new();
        assert!(!shared.is_active());
        shared.set_active(true);
        assert!(shared.is_active());
        shared.set_active(false);
        assert!(!shared.is_active());
    }

    #[test]
    fn test_cs_pin_taken_once() {
        let shared = TransferShared::new();
        shared.select(Pin::new(4));
        assert_eq!(shared.take_selected(), Some(Pin::new(4)));
        assert_eq!(shared.take_selected(), None);
    }

    #[test]
    fn test_completion_slot() {
        let shared = TransferShared::new();
        assert_eq!(shared.take_completion(), None);

        let event = Completion {
            device: DeviceId::new(1),
            outcome: TransferOutcome::Done,
        };
        shared.post(event);
        assert_eq!(shared.take_completion(), Some(event));
        assert_eq!(shared.take_completion(), None);
    }
}
