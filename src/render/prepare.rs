//! # Raster Preparation
//!
//! Turns a decoded source image into a [`MonoRaster`] sized for the head.
//!
//! ## Pipeline
//!
//! ```text
//! source ─► flatten on white ─► resize (Lanczos3) ─► brightness ─► contrast
//!        ─► grey (601 luma) ─► Floyd-Steinberg / threshold ─► pad white rows
//! ```
//!
//! Brightness runs before contrast: brightness moves the working range, then
//! contrast stretches it around the image's mean grey level.
//!
//! ## Example
//!
//! ```
//! use hotprint::printer::PrintConfig;
//! use hotprint::render::prepare::prepare;
//! use image::{DynamicImage, RgbImage};
//!
//! let source = DynamicImage::ImageRgb8(RgbImage::new(1000, 400));
//! let config = PrintConfig::default();
//!
//! let raster = prepare(&source, &config).unwrap();
//! assert_eq!(raster.width(), 496);
//! assert_eq!(raster.height(), 279 + 30);
//! ```

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, RgbImage, imageops::FilterType};
use log::debug;

use super::dither::{self, DitheringAlgorithm};
use super::raster::MonoRaster;
use crate::error::PrepError;
use crate::printer::PrintConfig;

/// A decoded source image, owned by the caller.
pub type SourceImage = DynamicImage;

/// Anything that can hand the print job a prepared raster.
///
/// Implemented by [`ImageFile`] and by closures
/// `Fn(&PrintConfig) -> Result<MonoRaster, PrepError>`.
pub trait RasterSource {
    fn raster(&self, config: &PrintConfig) -> Result<MonoRaster, PrepError>;
}

impl<F> RasterSource for F
where
    F: Fn(&PrintConfig) -> Result<MonoRaster, PrepError>,
{
    fn raster(&self, config: &PrintConfig) -> Result<MonoRaster, PrepError> {
        self(config)
    }
}

/// Prepare `source` for printing with `config`.
///
/// The result is exactly `config.width` dots wide and
/// `config.height + config.padding_rows` rows tall.
pub fn prepare(source: &SourceImage, config: &PrintConfig) -> Result<MonoRaster, PrepError> {
    config.check_dimensions()?;
    if source.width() == 0 || source.height() == 0 {
        return Err(PrepError::SourceMissing("source image is empty".to_string()));
    }

    let rgb = flatten_on_white(source);
    let resized = image::imageops::resize(&rgb, config.width, config.height, FilterType::Lanczos3);
    let toned = apply_tone(resized, config.brightness, config.contrast);
    let gray = to_luma601(&toned);

    let algo = DitheringAlgorithm::from_flag(config.use_dither);
    let dots = dither::binarize(&gray, algo);

    debug!(
        "Prepared {}x{} source as {}x{} raster ({:?}, {} padding rows)",
        source.width(),
        source.height(),
        config.width,
        config.raster_height(),
        algo,
        config.padding_rows
    );

    // Rows past the image stay white
    Ok(MonoRaster::from_dots(
        config.width,
        config.raster_height(),
        &dots,
    ))
}

/// Composite any alpha channel onto white paper.
fn flatten_on_white(source: &SourceImage) -> RgbImage {
    if !source.color().has_alpha() {
        return source.to_rgb8();
    }

    let rgba = source.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Brightness gain followed by contrast gain.
pub fn apply_tone(mut img: RgbImage, brightness: f32, contrast: f32) -> RgbImage {
    if brightness != 1.0 {
        adjust_brightness(&mut img, brightness);
    }
    if contrast != 1.0 {
        adjust_contrast(&mut img, contrast);
    }
    img
}

/// Scale every channel by `gain`, clamped to 0..=255 and truncated.
pub fn adjust_brightness(img: &mut RgbImage, gain: f32) {
    for pixel in img.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = clamp_u8(*c as f32 * gain);
        }
    }
}

/// Stretch every channel away from the mean grey level by `gain`.
pub fn adjust_contrast(img: &mut RgbImage, gain: f32) {
    let mean = mean_luma(img);
    for pixel in img.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = clamp_u8(mean + (*c as f32 - mean) * gain);
        }
    }
}

/// Mean ITU-R 601 luma, rounded to a whole grey level.
fn mean_luma(img: &RgbImage) -> f32 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| luma601(p.0) as u64).sum();
    (sum as f64 / count as f64).round() as f32
}

/// ITU-R 601-2 luma, rounded to nearest: `L = R*0.299 + G*0.587 + B*0.114`.
///
/// 16.16 fixed point, the same weights and rounding as PIL's `L` mode.
#[inline]
fn luma601([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

fn to_luma601(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([luma601(img.get_pixel(x, y).0)])
    })
}

/// Truncates toward zero, like PIL's blend.
#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

// ============================================================================
// IMAGE FILE SOURCE
// ============================================================================

/// An image file decoded fresh for every job, so edits to the file show up
/// on the next print.
#[derive(Debug, Clone)]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the file.
    ///
    /// A missing or undecodable file is [`PrepError::SourceMissing`].
    pub fn load(&self) -> Result<SourceImage, PrepError> {
        if !self.path.exists() {
            return Err(PrepError::SourceMissing(format!(
                "{} not found",
                self.path.display()
            )));
        }

        #[cfg(feature = "heif")]
        if is_heif_path(&self.path) {
            return heif::decode_file(&self.path);
        }

        image::open(&self.path).map_err(|e| {
            PrepError::SourceMissing(format!("{}: {}", self.path.display(), e))
        })
    }
}

impl RasterSource for ImageFile {
    fn raster(&self, config: &PrintConfig) -> Result<MonoRaster, PrepError> {
        let source = self.load()?;
        prepare(&source, config)
    }
}

#[cfg(feature = "heif")]
fn is_heif_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "heic" | "heif"))
        .unwrap_or(false)
}

#[cfg(feature = "heif")]
mod heif {
    use std::path::Path;

    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    use crate::error::PrepError;

    /// Decode a HEIC/HEIF file using libheif.
    pub fn decode_file(path: &Path) -> Result<DynamicImage, PrepError> {
        let unreadable = |e: String| PrepError::SourceMissing(format!("{}: {}", path.display(), e));

        let path_str = path
            .to_str()
            .ok_or_else(|| unreadable("path is not valid UTF-8".to_string()))?;
        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_file(path_str).map_err(|e| unreadable(e.to_string()))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| unreadable(e.to_string()))?;
        let image = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| unreadable(e.to_string()))?;

        let planes = image.planes();
        let interleaved = planes
            .interleaved
            .ok_or_else(|| unreadable("no interleaved RGB data".to_string()))?;

        let width = image.width();
        let height = image.height();
        let stride = interleaved.stride;
        let data = interleaved.data;

        let mut rgb = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let offset = (y as usize * stride) + (x as usize * 3);
                if offset + 2 < data.len() {
                    rgb.put_pixel(
                        x,
                        y,
                        image::Rgb([data[offset], data[offset + 1], data[offset + 2]]),
                    );
                }
            }
        }

        Ok(DynamicImage::ImageRgb8(rgb))
    }
}

// ============================================================================
// TESTS
// ============================================================================
