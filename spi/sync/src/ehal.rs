//! `embedded-hal` 1.0 bus adapter
//!
//! Lets ecosystem drivers consume the facade through
//! [`embedded_hal::spi::SpiBus`]. Chip-select stays with the upper layer
//! (e.g. `embedded-hal-bus`); the adapter always transfers with no CS pin.

use core::cmp::min;

use embedded_hal::spi::{Error, ErrorKind, ErrorType, SpiBus};
use heapless::Vec;
use sharedspi_core::{CacheOps, SpiError, SpiPeripheral};

use crate::SpiTransceiver;

const CHUNK: usize = 32;

/// Error wrapper satisfying the `embedded-hal` error contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError(pub SpiError);

impl Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Blocking `SpiBus` view of a transceiver
pub struct BlockingSpi<'a, B: SpiPeripheral, C: CacheOps> {
    inner: &'a mut SpiTransceiver<B, C>,
    timeout_ms: u32,
}

impl<'a, B: SpiPeripheral, C: CacheOps> BlockingSpi<'a, B, C> {
    pub fn new(inner: &'a mut SpiTransceiver<B, C>, timeout_ms: u32) -> Self {
        Self { inner, timeout_ms }
    }

    fn xfer(&mut self, tx: Option<&[u8]>, rx: Option<&mut [u8]>) -> Result<(), BusError> {
        self.inner
            .transceive(tx, rx, None, self.timeout_ms)
            .map_err(BusError)
    }
}

impl<B: SpiPeripheral, C: CacheOps> ErrorType for BlockingSpi<'_, B, C> {
    type Error = BusError;
}

impl<B: SpiPeripheral, C: CacheOps> SpiBus<u8> for BlockingSpi<'_, B, C> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        if words.is_empty() {
            return Ok(());
        }
        self.xfer(None, Some(words))
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if words.is_empty() {
            return Ok(());
        }
        self.xfer(Some(words), None)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        // The engine wants equally sized buffers; run the common prefix full
        // duplex and the remainder half duplex
        let common = min(read.len(), write.len());
        if common > 0 {
            let (head, _) = read.split_at_mut(common);
            self.xfer(Some(&write[..common]), Some(head))?;
        }
        if write.len() > common {
            self.xfer(Some(&write[common..]), None)?;
        }
        if read.len() > common {
            self.xfer(None, Some(&mut read[common..]))?;
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for chunk in words.chunks_mut(CHUNK) {
            let staged: Vec<u8, CHUNK> = Vec::from_slice(chunk)
                .map_err(|_| BusError(SpiError::InvalidParameter))?;
            self.xfer(Some(&staged), Some(chunk))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
