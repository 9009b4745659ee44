//! # Print Jobs
//!
//! One print job = density setting, raster transfer, trailing feed, and a
//! blocking wait for the paper to clear the head.
//!
//! ## Modules
//!
//! - [`sequencer`]: [`PrintJobSequencer`] and the job state machine
//! - [`staging`]: transient per-job resources and their scoped release

pub mod sequencer;
pub mod staging;

pub use sequencer::{JobState, PrintJob, PrintJobSequencer};
pub use staging::{NoStaging, PngStaging, Staging, StagingGuard};
