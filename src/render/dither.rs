//! # Binarisation
//!
//! Converts an 8-bit grey image to black/white dots for the print head.
//!
//! ## Methods
//!
//! | Method | Quality | Artifacts |
//! |--------|---------|-----------|
//! | Threshold | Poor on photos | Banding, flat areas go solid |
//! | Floyd-Steinberg | Good | Fine noise, "worms" in flat areas |
//!
//! ## Floyd-Steinberg
//!
//! Pixels are visited in raster-scan order. Each pixel snaps to black or
//! white and the quantisation error is pushed onto neighbours that have not
//! been visited yet:
//!
//! ```text
//!              ┌───────┬───────┐
//!              │   *   │ 7/16  │
//!      ┌───────┼───────┼───────┤
//!      │ 3/16  │ 5/16  │ 1/16  │
//!      └───────┴───────┴───────┘
//! ```
//!
//! Local averages of the output match the input, so mid-grey comes out as a
//! fine pattern of dots rather than a flat fill.
//!
//! ## Convention
//!
//! Grey values follow image convention (0 = black, 255 = white). Output
//! pixels are `true` where a dot is printed (black).

use image::GrayImage;

/// Grey level at or above which a pixel is white.
pub const THRESHOLD: u8 = 128;

/// Binarisation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitheringAlgorithm {
    /// Hard per-pixel threshold at [`THRESHOLD`]
    None,
    /// Floyd-Steinberg error diffusion
    #[default]
    FloydSteinberg,
}

impl DitheringAlgorithm {
    /// Pick the method from a `use_dither` flag.
    pub fn from_flag(use_dither: bool) -> Self {
        if use_dither {
            Self::FloydSteinberg
        } else {
            Self::None
        }
    }
}

/// Binarise a grey image. Returns `width * height` dots, row-major.
pub fn binarize(img: &GrayImage, algo: DitheringAlgorithm) -> Vec<bool> {
    match algo {
        DitheringAlgorithm::None => threshold(img, THRESHOLD),
        DitheringAlgorithm::FloydSteinberg => floyd_steinberg(img),
    }
}

/// Hard threshold: grey values below `level` print.
pub fn threshold(img: &GrayImage, level: u8) -> Vec<bool> {
    img.pixels().map(|p| p.0[0] < level).collect()
}

/// Floyd-Steinberg error diffusion against [`THRESHOLD`].
pub fn floyd_steinberg(img: &GrayImage) -> Vec<bool> {
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);

    let mut buffer: Vec<f32> = img.pixels().map(|p| p.0[0] as f32).collect();
    let mut dots = vec![false; width * height];
    let cut = THRESHOLD as f32;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = buffer[idx];
            let new = if old >= cut { 255.0 } else { 0.0 };
            dots[idx] = new == 0.0;

            let error = old - new;
            if error != 0.0 {
                diffuse(&mut buffer, x, y, width, height, error);
            }
        }
    }

    dots
}

/// Push quantisation error onto unvisited neighbours.
fn diffuse(buffer: &mut [f32], x: usize, y: usize, width: usize, height: usize, error: f32) {
    let idx = y * width + x;
    let has_right = x + 1 < width;
    let has_below = y + 1 < height;

    if has_right {
        buffer[idx + 1] += error * 7.0 / 16.0;
    }
    if has_below {
        let below = idx + width;
        if x > 0 {
            buffer[below - 1] += error * 3.0 / 16.0;
        }
        buffer[below] += error * 5.0 / 16.0;
        if has_right {
            buffer[below + 1] += error / 16.0;
        }
    }
}

/// Pack a row of boolean pixel values into bytes.
///
/// - Bit 7 (MSB) = leftmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros (white) on the right.
///
/// ```
/// use hotprint::render::dither::pack_row;
///
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]);
///
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================
