#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # Shared SPI Synchronous Facade
//!
//! Wraps the transfer engine with chip-select control, caller-context
//! blocking with timeout and recovery from stalled transfers, presenting a
//! single blocking transceive call to upper firmware layers such as SD-card
//! or CAN-controller drivers. An [`embedded-hal`](embedded_hal) 1.0
//! [`SpiBus`](embedded_hal::spi::SpiBus) adapter is provided in [`ehal`].

pub mod ehal;
pub mod transceiver;

pub use ehal::*;
pub use transceiver::*;
