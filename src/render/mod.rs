//! # Rendering Module
//!
//! Turns source images into printable 1-bit rasters.
//!
//! ## Modules
//!
//! - [`prepare`]: resize, tone adjustment, binarisation and padding
//! - [`dither`]: Floyd-Steinberg and threshold binarisation, bit packing
//! - [`raster`]: the [`MonoRaster`] bitmap
//!
//! ## Usage Example
//!
//! ```
//! use hotprint::printer::PrintConfig;
//! use hotprint::render::{self, MonoRaster};
//! use image::{DynamicImage, GrayImage, Luma};
//!
//! let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 100, Luma([128])));
//! let raster: MonoRaster = render::prepare(&source, &PrintConfig::default()).unwrap();
//!
//! // raster is ready for protocol::graphics::encode_raster()
//! assert_eq!(raster.width_bytes(), 62);
//! ```

pub mod dither;
pub mod prepare;
pub mod raster;

pub use prepare::{ImageFile, RasterSource, SourceImage, prepare};
pub use raster::MonoRaster;
