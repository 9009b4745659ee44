//! # Error Types
//!
//! Error types for each layer of the print pipeline.
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`PrepError`] | Image loading and raster preparation |
//! | [`TransportError`] | Device I/O and job staging |
//! | [`PrintError`] | A whole print job ([`crate::job::PrintJobSequencer::submit`]) |
//! | [`HotprintError`] | The CLI |

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source image into a printable raster.
///
/// Always raised before any protocol byte is written.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The source image does not exist or could not be decoded.
    #[error("Source image missing: {0}")]
    SourceMissing(String),

    /// Target raster dimensions are zero, too large for `GS v 0`, or do not
    /// match the configured raster.
    #[error("Invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Transport-level errors (connection, I/O, staging)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to open {}: {source}", device.display())]
    Open {
        device: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Write or flush failed on an open device
    #[error("Write failed: {0}")]
    Io(#[from] io::Error),

    /// TTY configuration failed
    #[error("TTY error: {0}")]
    Tty(String),

    /// Raster rows are wider than a `GS v 0` header can describe
    #[error("Raster too wide: {width_bytes} bytes per row (max 65535)")]
    RasterTooWide { width_bytes: usize },

    /// The prepared raster could not be staged for the job
    #[error("Staging failed: {0}")]
    Staging(#[source] io::Error),
}

/// Outcome of a failed print job.
#[derive(Debug, Error)]
pub enum PrintError {
    /// The raster could not be prepared; nothing was sent.
    #[error("Preparation failed: {0}")]
    PreparationFailed(#[from] PrepError),

    /// A write to the printer failed mid-job.
    #[error("Transmission failed: {0}")]
    TransmissionFailed(#[source] TransportError),

    /// The print configuration violates its invariants.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Top-level error type for the `hotprint` binary
#[derive(Debug, Error)]
pub enum HotprintError {
    #[error(transparent)]
    Print(#[from] PrintError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Prep(#[from] PrepError),

    /// Config file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Image export error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
