//! # In-Memory Transport
//!
//! Records everything written to it. Used for `--dump` dry runs, where the
//! byte stream is saved to a file instead of reaching a printer, and by tests.

use std::io;

use super::Transport;
use crate::error::TransportError;
use crate::protocol::{commands, graphics};
use crate::render::MonoRaster;

/// One call made on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Bytes(Vec<u8>),
    Text(String),
    Raster { width: u32, height: u32 },
}

/// Transport that keeps the byte stream in memory.
///
/// ```
/// use hotprint::transport::{MemoryTransport, Transport};
///
/// let mut transport = MemoryTransport::new();
/// transport.write_text("\n\n").unwrap();
/// assert_eq!(transport.bytes(), b"\n\n");
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    bytes: Vec<u8>,
    calls: Vec<Call>,
    fail_raster: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose raster writes fail with a broken-pipe error.
    pub fn failing_raster() -> Self {
        Self {
            fail_raster: true,
            ..Self::default()
        }
    }

    /// Everything written so far, in order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The calls made so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Transport for MemoryTransport {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.bytes.extend_from_slice(data);
        self.calls.push(Call::Bytes(data.to_vec()));
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.bytes.extend(commands::encode_text(text));
        self.calls.push(Call::Text(text.to_string()));
        Ok(())
    }

    fn write_raster(&mut self, raster: &MonoRaster) -> Result<(), TransportError> {
        if self.fail_raster {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "raster write refused",
            )));
        }
        self.bytes.extend(graphics::encode_raster(raster)?);
        self.calls.push(Call::Raster {
            width: raster.width(),
            height: raster.height(),
        });
        Ok(())
    }
}
