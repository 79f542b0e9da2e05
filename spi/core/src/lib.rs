#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Shared SPI Core
//!
//! Core types and port traits for the shared SPI transfer engine. This crate
//! defines the vocabulary of the driver (configuration snapshots, transfer
//! strategies, completion events) and the boundary traits implemented by
//! platform ports: the vendor peripheral primitives, the cache-maintenance
//! service, the chip-select port and the task-synchronization primitive.

use core::fmt;

pub mod bus;
pub mod cache;
pub mod config;
pub mod events;
pub mod pins;
pub mod request;
pub mod strategy;
pub mod sync;

pub use bus::*;
pub use cache::*;
pub use config::*;
pub use events::*;
pub use pins::*;
pub use request::*;
pub use strategy::*;
pub use sync::*;

/// Result type used throughout the shared SPI driver
pub type SpiResult<T> = Result<T, SpiError>;

/// Error types for shared SPI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiError {
    /// Peripheral or DMA channel reported not-ready when a transfer was
    /// requested; recorded as a soft fault, the transfer proceeds anyway
    HardwareNotReady,
    /// No completion signal arrived within the caller's deadline
    Timeout,
    /// The device's transfer strategy is not supported on this platform
    InvalidIoStrategy,
    /// The device has not been configured yet
    NotConfigured,
    /// Invalid transfer request (empty, or mismatched buffer lengths)
    InvalidParameter,
    /// The peripheral reported a fault during the transfer
    Hardware,
    /// Vendor-specific error code
    Vendor(i32),
}

impl fmt::Display for SpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareNotReady => write!(f, "hardware not ready"),
            Self::Timeout => write!(f, "transfer timeout"),
            Self::InvalidIoStrategy => write!(f, "invalid I/O strategy"),
            Self::NotConfigured => write!(f, "device not configured"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::Hardware => write!(f, "hardware fault"),
            Self::Vendor(code) => write!(f, "vendor error code: {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpiError {}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::HardwareNotReady => defmt::write!(fmt, "HardwareNotReady"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::InvalidIoStrategy => defmt::write!(fmt, "InvalidIoStrategy"),
            Self::NotConfigured => defmt::write!(fmt, "NotConfigured"),
            Self::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            Self::Hardware => defmt::write!(fmt, "Hardware"),
            Self::Vendor(code) => defmt::write!(fmt, "Vendor({=i32})", *code),
        }
    }
}
