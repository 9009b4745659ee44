//! # Monochrome Raster
//!
//! [`MonoRaster`] is the 1-bit bitmap handed to the printer: row-major,
//! `ceil(width / 8)` bytes per row, MSB = leftmost dot, 1 = black.

use std::path::Path;

use image::{GrayImage, Luma};

use super::dither::pack_row;
use crate::error::HotprintError;

/// A prepared 1-bit raster. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MonoRaster {
    /// An all-white raster.
    pub fn blank(width: u32, height: u32) -> Self {
        let len = (width as usize).div_ceil(8) * height as usize;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Build from row-major dots, `true` = black. Extra rows of white are
    /// appended to reach `height` if `dots` holds fewer rows.
    pub fn from_dots(width: u32, height: u32, dots: &[bool]) -> Self {
        let mut raster = Self::blank(width, height);
        if width == 0 {
            return raster;
        }

        let width_bytes = raster.width_bytes();
        for (y, row) in dots.chunks(width as usize).take(height as usize).enumerate() {
            let packed = pack_row(row);
            let start = y * width_bytes;
            raster.data[start..start + packed.len()].copy_from_slice(&packed);
        }
        raster
    }

    /// Build by evaluating `is_black(x, y)` for every dot.
    pub fn from_fn<F>(width: u32, height: u32, is_black: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        let dots: Vec<bool> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| is_black(x, y))
            .collect();
        Self::from_dots(width, height, &dots)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn width_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Packed data, `width_bytes() * height()` bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Packed bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let width_bytes = self.width_bytes();
        let start = y as usize * width_bytes;
        &self.data[start..start + width_bytes]
    }

    /// Whether the dot at (x, y) is black. Out of range reads as white.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.row(y)[x as usize / 8];
        (byte >> (7 - (x % 8))) & 1 == 1
    }

    /// Number of black dots.
    pub fn black_count(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Render as a greyscale image (black dots = 0, white = 255).
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.is_black(x, y) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    /// Save as a PNG preview.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), HotprintError> {
        self.to_gray_image()
            .save(path.as_ref())
            .map_err(|e| HotprintError::Image(format!("Failed to save PNG: {}", e)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_white() {
        let raster = MonoRaster::blank(496, 309);
        assert_eq!(raster.data().len(), 62 * 309);
        assert_eq!(raster.black_count(), 0);
    }

    #[test]
    fn test_from_dots_packs_rows() {
        let dots = [
            true, false, false, false, false, false, false, false, true, //
            false, false, false, false, false, false, false, false, true,
        ];
        let raster = MonoRaster::from_dots(9, 2, &dots);

        assert_eq!(raster.width_bytes(), 2);
        assert_eq!(raster.row(0), &[0x80, 0x80]);
        assert_eq!(raster.row(1), &[0x00, 0x80]);
    }

    #[test]
    fn test_from_dots_pads_missing_rows_white() {
        let raster = MonoRaster::from_dots(8, 3, &[true; 8]);
        assert_eq!(raster.data(), &[0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_is_black() {
        let raster = MonoRaster::from_fn(10, 4, |x, y| x == y);
        assert!(raster.is_black(0, 0));
        assert!(raster.is_black(3, 3));
        assert!(!raster.is_black(1, 0));
        assert!(!raster.is_black(20, 0));
        assert_eq!(raster.black_count(), 4);
    }

    #[test]
    fn test_to_gray_image() {
        let raster = MonoRaster::from_fn(3, 1, |x, _| x == 1);
        let img = raster.to_gray_image();
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
    }
}
