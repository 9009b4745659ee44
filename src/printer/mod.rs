//! # Printer Module
//!
//! Printer hardware parameters and print tuning.
//!
//! ## Modules
//!
//! - [`config`]: [`PrintConfig`] and the feed-time estimate

pub mod config;

pub use config::{PrintConfig, estimate_feed_seconds};
