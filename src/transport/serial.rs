//! # Serial Transport
//!
//! Sends ESC/POS data to a printer attached to a serial tty: a USB serial
//! adapter (`/dev/ttyUSB0`), an on-board port (`/dev/ttyS0`) or a bound
//! Bluetooth RFCOMM device (`/dev/rfcomm0`).
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary data is transmitted without
//! modification:
//!
//! - **Speed**: the configured baud rate on both directions (default 9600)
//! - **Framing**: 8 data bits, no parity, 1 stop bit
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR,
//!   ICRNL, IXON, IXOFF, IXANY cleared
//! - **No output processing**: OPOST cleared (no CR/LF translation)
//! - **Non-canonical, no echo**: ECHO, ECHONL, ICANON, ISIG, IEXTEN cleared
//!
//! ## Chunked Writes
//!
//! Large writes (raster data) are split into chunks with a short pause
//! between them so slow links do not overrun the printer's receive buffer.
//!
//! ## Lifecycle
//!
//! The device closes when the transport is dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use super::Transport;
use crate::error::TransportError;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Default baud rate
pub const DEFAULT_BAUD: u32 = 9600;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 1024;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Serial Printer Transport
///
/// ## Example
///
/// ```no_run
/// use hotprint::protocol::commands;
/// use hotprint::transport::{SerialTransport, Transport};
///
/// let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600)?;
/// transport.write_bytes(&commands::init())?;
///
/// # Ok::<(), hotprint::error::TransportError>(())
/// ```
pub struct SerialTransport {
    file: File,
    device: PathBuf,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialTransport {
    /// Open a serial device and configure it for raw binary output.
    ///
    /// ## Errors
    ///
    /// - [`TransportError::Open`] if the device doesn't exist or permission
    ///   is denied (may need the dialout group)
    /// - [`TransportError::Tty`] if the path is not a tty or the baud rate
    ///   is not supported
    pub fn open<P: AsRef<Path>>(device: P, baud: u32) -> Result<Self, TransportError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| TransportError::Open {
                device: path.to_path_buf(),
                source,
            })?;

        configure_tty_raw(&file, baud)?;
        info!("Opened {} at {} baud", path.display(), baud);

        Ok(Self {
            file,
            device: path.to_path_buf(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Open the default device at the default baud rate.
    pub fn open_default() -> Result<Self, TransportError> {
        Self::open(DEFAULT_DEVICE, DEFAULT_BAUD)
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Set the chunk size for large writes. Default is 1024 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks. Default is 2ms.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if data.is_empty() {
            return Ok(());
        }

        if data.len() <= self.chunk_size {
            self.file.write_all(data)?;
        } else {
            debug!(
                "Writing {} bytes in {} chunks",
                data.len(),
                data.len().div_ceil(self.chunk_size)
            );
            for chunk in data.chunks(self.chunk_size) {
                self.file.write_all(chunk)?;

                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }

        self.file.flush()?;
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        debug!("Closing {}", self.device.display());
    }
}

/// Map a numeric baud rate onto its termios speed constant.
#[cfg(unix)]
fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

/// Configure a file for raw TTY mode at `baud`.
///
/// IXON/IXOFF/IXANY disable XON/XOFF software flow control. 0x11 (XON) and
/// 0x13 (XOFF) appear in raster data and must reach the printer untouched.
#[cfg(unix)]
fn configure_tty_raw(file: &File, baud: u32) -> Result<(), TransportError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let speed = baud_constant(baud)
        .ok_or_else(|| TransportError::Tty(format!("Unsupported baud rate {}", baud)))?;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TransportError::Tty(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // 8N1, ignore modem control lines
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    termios.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;

    let speed_ok = unsafe {
        libc::cfsetispeed(&mut termios, speed) == 0 && libc::cfsetospeed(&mut termios, speed) == 0
    };
    if !speed_ok {
        return Err(TransportError::Tty(format!(
            "Failed to set {} baud: {}",
            baud,
            io::Error::last_os_error()
        )));
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TransportError::Tty(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File, _baud: u32) -> Result<(), TransportError> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_DEVICE, "/dev/ttyUSB0");
        assert_eq!(DEFAULT_BAUD, 9600);
    }

    #[cfg(unix)]
    #[test]
    fn test_baud_constants() {
        assert_eq!(baud_constant(9600), Some(libc::B9600));
        assert_eq!(baud_constant(115200), Some(libc::B115200));
        assert_eq!(baud_constant(9601), None);
        assert_eq!(baud_constant(0), None);
    }

    #[test]
    fn test_open_missing_device() {
        let result = SerialTransport::open("/dev/does-not-exist-hotprint", 9600);
        match result {
            Err(TransportError::Open { device, .. }) => {
                assert_eq!(device, PathBuf::from("/dev/does-not-exist-hotprint"));
            }
            Err(other) => panic!("expected Open error, got {:?}", other),
            Ok(_) => panic!("expected Open error, got a transport"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_open_regular_file_is_not_a_tty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = SerialTransport::open(file.path(), 9600);
        assert!(matches!(result, Err(TransportError::Tty(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unsupported_baud_rejected_before_tty_calls() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = SerialTransport::open(file.path(), 12345);
        match result {
            Err(TransportError::Tty(msg)) => assert!(msg.contains("12345")),
            _ => panic!("expected unsupported baud error"),
        }
    }

    // Writing to a real printer requires hardware; run manually with a
    // connected device.
}
