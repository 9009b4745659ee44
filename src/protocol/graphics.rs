//! # ESC/POS Raster Graphics
//!
//! Raster bit image command (`GS v 0`) used to transfer a prepared
//! [`MonoRaster`] to the printer.
//!
//! ## Bit Packing
//!
//! Graphics data is packed as bytes where each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```
//!
//! ## Tall Images
//!
//! Printers buffer a limited number of raster rows per command, so images
//! taller than [`FRAGMENT_ROWS`] are sent as consecutive commands of at most
//! that many rows. Fragments print seamlessly one after another.

use super::commands::{GS, u16_le};
use crate::error::TransportError;
use crate::render::raster::MonoRaster;

/// Maximum rows per `GS v 0` command.
pub const FRAGMENT_ROWS: u32 = 960;

/// Header length of a `GS v 0` command.
pub const RASTER_HEADER_LEN: usize = 8;

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH d1...dk |
/// | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
///
/// ## Parameters
///
/// - `m`: 0 = normal scale (1 dot = 1 dot)
/// - `xL xH`: width in **bytes**, little-endian
/// - `yL yH`: height in rows, little-endian
/// - `d1...dk`: `width_bytes * height` bytes of row-major packed data
///
/// ## Example
///
/// ```
/// use hotprint::protocol::graphics;
///
/// let data = vec![0xFF; 62 * 10];
/// let cmd = graphics::raster(62, 10, &data);
///
/// assert_eq!(&cmd[0..8], &[0x1D, 0x76, 0x30, 0x00, 62, 0, 10, 0]);
/// assert_eq!(cmd.len(), 8 + 62 * 10);
/// ```
pub fn raster(width_bytes: u16, height: u16, data: &[u8]) -> Vec<u8> {
    debug_assert!(
        data.len() == width_bytes as usize * height as usize,
        "Raster data length mismatch. Expected {} ({} bytes × {} rows), got {}",
        width_bytes as usize * height as usize,
        width_bytes,
        height,
        data.len()
    );

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(RASTER_HEADER_LEN + data.len());
    cmd.push(GS);
    cmd.push(b'v');
    cmd.push(b'0');
    cmd.push(0); // m = 0 (normal)
    cmd.push(xl);
    cmd.push(xh);
    cmd.push(yl);
    cmd.push(yh);
    cmd.extend_from_slice(data);
    cmd
}

/// Encode a whole raster, split into fragments of at most `FRAGMENT_ROWS` rows.
pub fn encode_raster(image: &MonoRaster) -> Result<Vec<u8>, TransportError> {
    encode_raster_fragments(image, FRAGMENT_ROWS)
}

/// Encode a raster with a custom fragment height.
///
/// Fails without producing any bytes if a row does not fit the 16-bit
/// width field.
pub fn encode_raster_fragments(
    image: &MonoRaster,
    max_rows: u32,
) -> Result<Vec<u8>, TransportError> {
    let max_rows = max_rows.clamp(1, u16::MAX as u32);
    let width_bytes = image.width_bytes();
    let Ok(header_width) = u16::try_from(width_bytes) else {
        return Err(TransportError::RasterTooWide { width_bytes });
    };

    let fragments = image.height().div_ceil(max_rows) as usize;
    let mut out = Vec::with_capacity(image.data().len() + fragments * RASTER_HEADER_LEN);

    let mut row = 0;
    while row < image.height() {
        let rows = max_rows.min(image.height() - row);
        let start = row as usize * width_bytes;
        let end = start + rows as usize * width_bytes;
        out.extend(raster(
            header_width,
            rows as u16,
            &image.data()[start..end],
        ));
        row += rows;
    }

    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32) -> MonoRaster {
        MonoRaster::from_fn(width, height, |_x, y| y % 2 == 0)
    }

    #[test]
    fn test_raster_header() {
        let data = vec![0xFF; 62 * 100];
        let cmd = raster(62, 100, &data);

        assert_eq!(cmd[0], 0x1D); // GS
        assert_eq!(cmd[1], 0x76); // 'v'
        assert_eq!(cmd[2], 0x30); // '0'
        assert_eq!(cmd[3], 0); // m = normal
        assert_eq!(cmd[4], 62); // xL
        assert_eq!(cmd[5], 0); // xH
        assert_eq!(cmd[6], 100); // yL
        assert_eq!(cmd[7], 0); // yH
    }

    #[test]
    fn test_raster_large_height() {
        let data = vec![0x00; 2 * 500];
        let cmd = raster(2, 500, &data);

        // 500 = 0x01F4 -> [0xF4, 0x01] in little-endian
        assert_eq!(cmd[6], 0xF4);
        assert_eq!(cmd[7], 0x01);
    }

    #[test]
    fn test_raster_preserves_data() {
        let data: Vec<u8> = (0..62 * 50).map(|i| (i % 256) as u8).collect();
        let cmd = raster(62, 50, &data);
        assert_eq!(&cmd[RASTER_HEADER_LEN..], &data[..]);
    }

    #[test]
    fn test_encode_single_fragment() {
        let image = striped(496, 309);
        let cmd = encode_raster(&image).unwrap();

        assert_eq!(cmd.len(), RASTER_HEADER_LEN + 62 * 309);
        assert_eq!(&cmd[4..8], &[62, 0, 0x35, 0x01]);
        assert_eq!(&cmd[RASTER_HEADER_LEN..], image.data());
    }

    #[test]
    fn test_encode_splits_tall_images() {
        let image = striped(16, 5);
        let cmd = encode_raster_fragments(&image, 2).unwrap();

        // 2 + 2 + 1 rows, 2 bytes per row
        assert_eq!(cmd.len(), 3 * RASTER_HEADER_LEN + 2 * 5);

        assert_eq!(&cmd[0..8], &[0x1D, 0x76, 0x30, 0, 2, 0, 2, 0]);
        assert_eq!(&cmd[8..12], &[0xFF, 0xFF, 0x00, 0x00]);

        let second = 12;
        assert_eq!(&cmd[second..second + 8], &[0x1D, 0x76, 0x30, 0, 2, 0, 2, 0]);
        assert_eq!(&cmd[second + 8..second + 12], &[0xFF, 0xFF, 0x00, 0x00]);

        let third = 24;
        assert_eq!(&cmd[third..third + 8], &[0x1D, 0x76, 0x30, 0, 2, 0, 1, 0]);
        assert_eq!(&cmd[third + 8..], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_widest_raster_fits_header() {
        // 65535 bytes = 524280 dots
        let image = MonoRaster::blank(524_280, 1);
        let cmd = encode_raster(&image).unwrap();
        assert_eq!(&cmd[4..8], &[0xFF, 0xFF, 1, 0]);
    }

    #[test]
    fn test_too_wide_raster_is_rejected() {
        let image = MonoRaster::blank(600_000, 1);
        let err = encode_raster(&image).unwrap_err();
        assert!(matches!(
            err,
            TransportError::RasterTooWide { width_bytes: 75_000 }
        ));
    }
}
