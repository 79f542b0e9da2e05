#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Shared SPI Transfer Engine
//!
//! Owns one physical SPI peripheral instance and its per-transfer state,
//! selects a transfer strategy (DMA, interrupt or polled), starts the
//! hardware operation and routes the completion - signaled from interrupt
//! context - back to the caller through a per-device single-slot channel.
//!
//! Interrupt handlers reach the owning device through the [`registry`]
//! rather than through statically addressed globals, so the completion path
//! only ever touches the interrupt-safe shared state of one instance.

pub mod device;
pub mod registry;
pub mod shared;

pub use device::*;
pub use registry::*;
pub use shared::*;

/// Maximum number of SPI peripheral instances in the system
pub const MAX_DEVICES: usize = 16;

/// Hardware timeout handed to the blocking polled primitive
pub const POLLED_TIMEOUT_MS: u32 = 250;

/// Settle delay applied when hardware reports not-ready before a transfer
pub const NOT_READY_SETTLE_MS: u32 = 100;
