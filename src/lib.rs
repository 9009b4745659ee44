//! # Hotprint - Thermal Receipt Image Printing
//!
//! Hotprint prints one fixed image on an ESC/POS thermal receipt printer
//! over a serial link. It provides:
//!
//! - **Raster preparation**: resize, brightness/contrast, Floyd-Steinberg
//!   dithering and tear-off padding
//! - **Print jobs**: density setting, raster transfer, trailing feed and a
//!   blocking wait for the estimated feed time, with guaranteed cleanup
//! - **Protocol implementation**: ESC/POS command builders
//! - **Transport**: raw-mode serial tty communication
//!
//! ## Quick Start
//!
//! ```no_run
//! use hotprint::{
//!     job::PrintJobSequencer,
//!     printer::PrintConfig,
//!     render::ImageFile,
//!     transport::SerialTransport,
//! };
//!
//! // Open connection to printer
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600)?;
//!
//! // 496×279 dots, 180 DPI, 100 mm/s, dithered
//! let mut sequencer = PrintJobSequencer::new(PrintConfig::default());
//!
//! // Decode, prepare, send, and wait for the paper to feed out
//! sequencer.submit(&ImageFile::new("mark.png"), &mut transport)?;
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`job`] | Print job sequencing and staging cleanup |
//! | [`render`] | Raster preparation and dithering |
//! | [`protocol`] | ESC/POS command builders |
//! | [`transport`] | Communication backends |
//! | [`printer`] | Print configuration |
//! | [`error`] | Error types |

pub mod error;
pub mod job;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::{HotprintError, PrepError, PrintError, TransportError};
pub use job::PrintJobSequencer;
pub use printer::PrintConfig;
pub use render::MonoRaster;
pub use transport::{SerialTransport, Transport};
