//! # Printer Transport Layer
//!
//! Communication backends for sending data to printers.
//!
//! The print job only ever writes through the [`Transport`] trait. Opening
//! and closing the device belongs to whoever owns the transport value.
//!
//! ## Available Transports
//!
//! - [`serial`]: raw-mode tty (USB serial adapters, RS-232, RFCOMM)
//! - [`memory`]: captures bytes in memory for dry runs and tests

pub mod memory;
pub mod serial;

pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use crate::error::TransportError;
use crate::protocol::{commands, graphics};
use crate::render::MonoRaster;

/// Write capability for a printer connection.
///
/// Writes either succeed or return an error; implementations must not block
/// forever without surfacing it.
pub trait Transport {
    /// Send raw protocol bytes.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Send printable text.
    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.write_bytes(&commands::encode_text(text))
    }

    /// Send a raster image.
    fn write_raster(&mut self, raster: &MonoRaster) -> Result<(), TransportError> {
        self.write_bytes(&graphics::encode_raster(raster)?)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(data)
    }

    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).write_text(text)
    }

    fn write_raster(&mut self, raster: &MonoRaster) -> Result<(), TransportError> {
        (**self).write_raster(raster)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(data)
    }

    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        (**self).write_text(text)
    }

    fn write_raster(&mut self, raster: &MonoRaster) -> Result<(), TransportError> {
        (**self).write_raster(raster)
    }
}
