//! # Print Configuration
//!
//! Fixed hardware and print parameters for one process lifetime.
//!
//! ## Reference Values
//!
//! | Option | Default | Meaning |
//! |--------|---------|---------|
//! | `width` × `height` | 496 × 279 | Raster size in dots before padding |
//! | `dpi` | 180 | Head resolution |
//! | `feed_speed_mm_s` | 100 | Mechanical feed speed |
//! | `brightness` / `contrast` | 1.6 / 1.6 | Tone gains |
//! | `use_dither` | true | Floyd-Steinberg instead of hard threshold |
//! | `padding_rows` | 30 | White tear-off rows below the image |
//! | `density` / `break_time` | 1 / 0 | Density command parameters |
//! | `feed_lines` | 6 | Blank lines pushed after the raster |
//! | `cut_after_feed` | false | Full cut once the feed has elapsed |
//!
//! ## Loading
//!
//! Every field has a default, so a JSON file only needs the fields it changes:
//!
//! ```
//! use hotprint::printer::PrintConfig;
//!
//! let config = PrintConfig::from_json(r#"{ "dpi": 203, "use_dither": false }"#).unwrap();
//! assert_eq!(config.dpi, 203);
//! assert!(!config.use_dither);
//! assert_eq!(config.width, 496);
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HotprintError, PrepError, PrintError};

/// Millimeters per inch, for DPI to mm conversion.
pub const MM_PER_INCH: f64 = 25.4;

/// # Print Configuration
///
/// Immutable once built. `validate()` enforces width > 0, height > 0,
/// DPI > 0 and feed speed > 0.
///
/// ## Calculations
///
/// ```text
/// mm_per_dot = 25.4 / dpi
/// feed_seconds = rows * mm_per_dot / feed_speed_mm_s
///
/// Defaults, padded raster (279 + 30 rows):
///   mm_per_dot = 25.4 / 180 ≈ 0.141
///   feed_seconds = 309 * 0.141 / 100 ≈ 0.436
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Raster width in dots (fixed by the print head)
    pub width: u32,

    /// Image height in dots, before padding
    pub height: u32,

    /// Head resolution in dots per inch
    pub dpi: u16,

    /// Paper feed speed in millimeters per second
    pub feed_speed_mm_s: f64,

    /// Brightness gain, 1.0 = unchanged
    pub brightness: f32,

    /// Contrast gain around the mean grey level, 1.0 = unchanged
    pub contrast: f32,

    /// Error-diffusion dithering instead of a hard threshold
    pub use_dither: bool,

    /// White rows appended below the image
    pub padding_rows: u32,

    /// Print density level sent in the density command
    pub density: u8,

    /// Inter-line break time sent in the density command
    pub break_time: u8,

    /// Blank lines sent after the raster to clear the print head
    pub feed_lines: usize,

    /// Send a full cut once the estimated feed time has elapsed
    pub cut_after_feed: bool,
}

impl PrintConfig {
    /// Reference configuration: 496×279 dots at 180 DPI, 100 mm/s.
    pub const REFERENCE: Self = Self {
        width: 496,
        height: 279,
        dpi: 180,
        feed_speed_mm_s: 100.0,
        brightness: 1.6,
        contrast: 1.6,
        use_dither: true,
        padding_rows: 30,
        density: 1,
        break_time: 0,
        feed_lines: 6,
        cut_after_feed: false,
    };

    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<(), PrintError> {
        self.check_dimensions()?;
        if self.dpi == 0 {
            return Err(PrintError::InvalidConfig("dpi must be > 0".to_string()));
        }
        if !self.feed_speed_mm_s.is_finite() || self.feed_speed_mm_s <= 0.0 {
            return Err(PrintError::InvalidConfig(format!(
                "feed_speed_mm_s must be > 0, got {}",
                self.feed_speed_mm_s
            )));
        }
        self.feed_duration(self.raster_height())?;
        Ok(())
    }

    /// Check only the raster dimensions.
    ///
    /// Both must be non-zero, a row must fit the 16-bit `GS v 0` width
    /// field, and the padded height must fit a `u32`.
    pub fn check_dimensions(&self) -> Result<(), PrepError> {
        let fits_header = self.width_bytes() <= u16::MAX as usize;
        if self.width == 0
            || self.height == 0
            || !fits_header
            || self.checked_raster_height().is_none()
        {
            return Err(PrepError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Height of the prepared raster including padding.
    ///
    /// Saturates on overflow; [`check_dimensions`](Self::check_dimensions)
    /// rejects such configs.
    #[inline]
    pub fn raster_height(&self) -> u32 {
        self.height.saturating_add(self.padding_rows)
    }

    /// Height of the prepared raster including padding, if it fits.
    #[inline]
    pub fn checked_raster_height(&self) -> Option<u32> {
        self.height.checked_add(self.padding_rows)
    }

    /// Width of one raster row in bytes.
    #[inline]
    pub fn width_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Estimated time for `rows` dots of paper to feed past the head.
    ///
    /// Fails when the estimate is not a representable duration, e.g. for a
    /// vanishingly small feed speed.
    pub fn feed_duration(&self, rows: u32) -> Result<Duration, PrintError> {
        let seconds = estimate_feed_seconds(rows, self.dpi, self.feed_speed_mm_s);
        Duration::try_from_secs_f64(seconds).map_err(|_| {
            PrintError::InvalidConfig(format!(
                "feed time for {} rows at {} dpi and {} mm/s is out of range",
                rows, self.dpi, self.feed_speed_mm_s
            ))
        })
    }

    /// Parse a JSON config. Missing fields keep their reference values.
    pub fn from_json(json: &str) -> Result<Self, HotprintError> {
        serde_json::from_str(json).map_err(|e| HotprintError::Config(e.to_string()))
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HotprintError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            HotprintError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Estimate how long the printer needs to feed `height_px` rows.
///
/// There is no completion signal from the printer, so this is the only
/// indication of when the paper has cleared the head.
///
/// ```
/// use hotprint::printer::config::estimate_feed_seconds;
///
/// let secs = estimate_feed_seconds(279, 180, 100.0);
/// assert!((secs - 0.3937).abs() < 1e-3);
/// ```
pub fn estimate_feed_seconds(height_px: u32, dpi: u16, feed_speed_mm_s: f64) -> f64 {
    let mm_per_px = MM_PER_INCH / dpi as f64;
    let height_mm = height_px as f64 * mm_per_px;
    height_mm / feed_speed_mm_s
}

// ============================================================================
// TESTS
// ============================================================================
