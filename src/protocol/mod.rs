//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for ESC/POS thermal receipt printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: Init, density, line feed, cut, text encoding
//! - [`graphics`]: Raster bit image transfer
//!
//! ## Usage Example
//!
//! ```
//! use hotprint::protocol::{commands, graphics};
//!
//! let mut data = Vec::new();
//! data.extend(commands::DensityCommand::new(1, 0).to_bytes());
//!
//! // One 8-dot wide, 2-row raster
//! data.extend(graphics::raster(1, 2, &[0xF0, 0x0F]));
//!
//! data.extend(commands::feed_lines(6));
//! assert_eq!(data.len(), 8 + 8 + 2 + 6);
//! ```

pub mod commands;
pub mod graphics;
