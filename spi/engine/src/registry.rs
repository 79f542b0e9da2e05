//! Device registry for interrupt-context completion routing

use core::cell::RefCell;

use critical_section::Mutex;
use sharedspi_core::{
    ChipSelectPort, Completion, DeviceId, SpiError, SpiResult, TaskSync, TransferOutcome,
};

use crate::{TransferShared, MAX_DEVICES};

/// Everything the completion handler needs for one device
pub struct DeviceSlot {
    shared: &'static TransferShared,
    cs_port: &'static dyn ChipSelectPort,
    notifier: &'static dyn TaskSync,
}

/// Registry mapping peripheral identity to its owning device slot
///
/// Free-standing interrupt handlers look their device up here instead of
/// addressing a statically named object, so the "completion touches only
/// this instance's shared state" contract does not rest on memory layout.
pub struct DeviceRegistry {
    slots: [Option<DeviceSlot>; MAX_DEVICES],
}

impl DeviceRegistry {
    pub const fn new() -> Self {
        const NONE: Option<DeviceSlot> = None;
        Self {
            slots: [NONE; MAX_DEVICES],
        }
    }

    /// Register a device slot under its peripheral identity
    ///
    /// Returns an error if the identity is out of range or already taken.
    pub fn attach(
        &mut self,
        id: DeviceId,
        shared: &'static TransferShared,
        cs_port: &'static dyn ChipSelectPort,
        notifier: &'static dyn TaskSync,
    ) -> SpiResult<()> {
        let idx = id.index();
        if idx >= MAX_DEVICES {
            return Err(SpiError::InvalidParameter);
        }
        if self.slots[idx].is_some() {
            return Err(SpiError::InvalidParameter);
        }
        self.slots[idx] = Some(DeviceSlot {
            shared,
            cs_port,
            notifier,
        });
        Ok(())
    }

    pub fn detach(&mut self, id: DeviceId) {
        if id.index() < MAX_DEVICES {
            self.slots[id.index()] = None;
        }
    }

    pub fn get(&self, id: DeviceId) -> Option<&DeviceSlot> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }
}

static REGISTRY: Mutex<RefCell<DeviceRegistry>> = Mutex::new(RefCell::new(DeviceRegistry::new()));

/// Get access to the global device registry
pub fn with_registry<F, R>(f: F) -> R
where
    F: FnOnce(&mut DeviceRegistry) -> R,
{
    critical_section::with(|cs| {
        let mut registry = REGISTRY.borrow_ref_mut(cs);
        f(&mut registry)
    })
}

/// Register a device in the global registry
pub fn attach_device(
    id: DeviceId,
    shared: &'static TransferShared,
    cs_port: &'static dyn ChipSelectPort,
    notifier: &'static dyn TaskSync,
) -> SpiResult<()> {
    with_registry(|registry| registry.attach(id, shared, cs_port, notifier))
}

/// Remove a device from the global registry
pub fn detach_device(id: DeviceId) {
    with_registry(|registry| registry.detach(id));
}

/// Completion entry point, called from interrupt context
///
/// Invoked by the platform's SPI/DMA completion handlers for DMA and
/// interrupt transfers, and synchronously by the engine for polled ones.
/// Performs interrupt-safe actions only: clears the busy flag, releases the
/// armed chip-select pin, posts the completion event and wakes the waiter.
/// A completion for an unregistered device is dropped.
pub fn transfer_complete(id: DeviceId, outcome: TransferOutcome) {
    with_registry(|registry| {
        if let Some(slot) = registry.get(id) {
            slot.shared.set_active(false);
            if let Some(pin) = slot.shared.take_selected() {
                slot.cs_port.deassert(pin);
            }
            slot.shared.post(Completion {
                device: id,
                outcome,
            });
            if let Some(ctx) = slot.shared.waiter() {
                slot.notifier.signal(ctx);
            }
        }
    });
}
