//! # Print Job Sequencer
//!
//! Drives one print job from prepared raster to cleared paper.
//!
//! ## Command Sequence
//!
//! ```text
//! GS ( E 03 00 00 density break_time     density setting
//! GS v 0 ...                             raster image
//! LF × feed_lines                        push image past the head
//!   ... wait estimated feed time ...
//! GS V 0                                 full cut (only if cut_after_feed)
//! ```
//!
//! ## Job States
//!
//! ```text
//! Idle ─► DensitySet ─► Transmitting ─► Feeding ─► Done
//!   │          │              │            │
//!   └──────────┴──────────────┴────────────┴─► Failed
//! ```
//!
//! Staged resources are released on every path out of a job, including
//! `Failed`.
//!
//! ## Timing
//!
//! The printer never reports that it has finished. The sequencer estimates
//! the feed time from the raster height, DPI and feed speed and blocks for
//! that long before reporting success.

use std::fmt;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use super::staging::{NoStaging, Staging, StagingGuard};
use crate::error::{PrepError, PrintError, TransportError};
use crate::printer::PrintConfig;
use crate::protocol::commands::{self, DensityCommand};
use crate::render::{MonoRaster, RasterSource};
use crate::transport::Transport;

/// Where the last job got to.
///
/// `Failed` records only that the job failed. The cause is the error
/// returned from [`PrintJobSequencer::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    DensitySet,
    Transmitting,
    Feeding,
    Done,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DensitySet => "density set",
            Self::Transmitting => "transmitting",
            Self::Feeding => "feeding",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A prepared raster and how long it takes to feed out.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub raster: MonoRaster,
    pub estimated_feed: Duration,
}

impl PrintJob {
    pub fn new(raster: MonoRaster, config: &PrintConfig) -> Result<Self, PrintError> {
        let estimated_feed = config.feed_duration(raster.height())?;
        Ok(Self {
            raster,
            estimated_feed,
        })
    }
}

type WaitFn = Box<dyn FnMut(Duration) + Send>;

/// Runs print jobs, one at a time, against a caller-owned transport.
///
/// ## Example
///
/// ```
/// use hotprint::job::PrintJobSequencer;
/// use hotprint::printer::PrintConfig;
/// use hotprint::render;
/// use hotprint::transport::MemoryTransport;
/// use image::{DynamicImage, RgbImage};
///
/// let source = DynamicImage::ImageRgb8(RgbImage::new(496, 279));
/// let provider = |config: &PrintConfig| render::prepare(&source, config);
///
/// let mut sequencer = PrintJobSequencer::new(PrintConfig::default())
///     .with_wait(|_| {});
/// let mut transport = MemoryTransport::new();
///
/// sequencer.submit(&provider, &mut transport).unwrap();
/// assert_eq!(&transport.bytes()[..8], &[0x1D, 0x28, 0x45, 0x03, 0x00, 0x00, 0x01, 0x00]);
/// ```
pub struct PrintJobSequencer<S: Staging = NoStaging> {
    config: PrintConfig,
    staging: S,
    wait: WaitFn,
    state: JobState,
}

impl PrintJobSequencer<NoStaging> {
    pub fn new(config: PrintConfig) -> Self {
        Self {
            config,
            staging: NoStaging,
            wait: Box::new(thread::sleep),
            state: JobState::Idle,
        }
    }
}

impl<S: Staging> PrintJobSequencer<S> {
    /// Use `staging` to park each job's raster while it prints.
    pub fn with_staging<T: Staging>(self, staging: T) -> PrintJobSequencer<T> {
        PrintJobSequencer {
            config: self.config,
            staging,
            wait: self.wait,
            state: self.state,
        }
    }

    /// Replace the feed wait (defaults to `thread::sleep`).
    pub fn with_wait<F>(mut self, wait: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        self.wait = Box::new(wait);
        self
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    pub fn staging(&self) -> &S {
        &self.staging
    }

    /// State reached by the most recent job.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Run one print job.
    ///
    /// 1. Prepare the raster and check it matches the configured size.
    ///    Nothing is written if this fails.
    /// 2. Stage the raster and arm cleanup.
    /// 3. Send the density command, the raster and the trailing feed.
    /// 4. Block for the estimated feed time, then cut if configured.
    ///
    /// Transmission errors end the job without retry. Staged resources are
    /// released before this returns, whatever the outcome.
    pub fn submit<R, T>(&mut self, source: &R, transport: &mut T) -> Result<(), PrintError>
    where
        R: RasterSource + ?Sized,
        T: Transport + ?Sized,
    {
        self.state = JobState::Idle;

        let result = run_job(
            &self.config,
            &mut self.staging,
            &mut self.wait,
            &mut self.state,
            source,
            transport,
        );

        if let Err(e) = &result {
            error!("Print job failed: {}", e);
            if self.state != JobState::Failed {
                advance(&mut self.state, JobState::Failed);
            }
        }
        result
    }
}

fn run_job<S, R, T>(
    config: &PrintConfig,
    staging: &mut S,
    wait: &mut WaitFn,
    state: &mut JobState,
    source: &R,
    transport: &mut T,
) -> Result<(), PrintError>
where
    S: Staging + ?Sized,
    R: RasterSource + ?Sized,
    T: Transport + ?Sized,
{
    config.validate()?;

    let raster = source.raster(config)?;
    if raster.width() != config.width || raster.height() != config.raster_height() {
        return Err(PrepError::InvalidDimensions {
            width: raster.width(),
            height: raster.height(),
        }
        .into());
    }
    let job = PrintJob::new(raster, config)?;

    let guard = StagingGuard::arm(staging, &job.raster)
        .map_err(|e| PrintError::TransmissionFailed(TransportError::Staging(e)))?;

    let result = transmit(config, &job, transport, wait, state);
    if result.is_err() {
        advance(state, JobState::Failed);
    }

    // Cleanup runs here on every path, and on unwind
    drop(guard);

    result.map_err(PrintError::TransmissionFailed)
}

fn transmit<T>(
    config: &PrintConfig,
    job: &PrintJob,
    transport: &mut T,
    wait: &mut WaitFn,
    state: &mut JobState,
) -> Result<(), TransportError>
where
    T: Transport + ?Sized,
{
    let density = DensityCommand::new(config.density, config.break_time);
    transport.write_bytes(&density.to_bytes())?;
    advance(state, JobState::DensitySet);

    info!(
        "Printing {}x{}... est {:.2}s",
        job.raster.width(),
        job.raster.height(),
        job.estimated_feed.as_secs_f64()
    );

    advance(state, JobState::Transmitting);
    transport.write_raster(&job.raster)?;
    if config.feed_lines > 0 {
        transport.write_text(&"\n".repeat(config.feed_lines))?;
    }

    advance(state, JobState::Feeding);
    wait(job.estimated_feed);

    if config.cut_after_feed {
        transport.write_bytes(&commands::cut_full())?;
    }

    advance(state, JobState::Done);
    info!("Done printing.");
    Ok(())
}

fn advance(state: &mut JobState, next: JobState) {
    debug!("Job {} -> {}", state, next);
    *state = next;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use crate::transport::memory::Call;
    use std::sync::{Arc, Mutex};

    fn small_config() -> PrintConfig {
        PrintConfig {
            width: 16,
            height: 4,
            padding_rows: 2,
            feed_lines: 3,
            ..PrintConfig::default()
        }
    }

    fn blank_source(config: &PrintConfig) -> Result<MonoRaster, PrepError> {
        Ok(MonoRaster::blank(config.width, config.raster_height()))
    }

    fn recording_wait() -> (Arc<Mutex<Vec<Duration>>>, impl FnMut(Duration) + Send + 'static) {
        let waits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&waits);
        (waits, move |d| sink.lock().unwrap().push(d))
    }

    #[test]
    fn test_successful_job_sequence() {
        let (waits, wait) = recording_wait();
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(wait);
        let mut transport = MemoryTransport::new();

        sequencer.submit(&blank_source, &mut transport).unwrap();

        assert_eq!(
            transport.calls(),
            &[
                Call::Bytes(vec![0x1D, 0x28, 0x45, 0x03, 0x00, 0x00, 0x01, 0x00]),
                Call::Raster {
                    width: 16,
                    height: 6
                },
                Call::Text("\n\n\n".to_string()),
            ]
        );
        assert_eq!(sequencer.state(), JobState::Done);

        let waits = waits.lock().unwrap();
        assert_eq!(waits.len(), 1);
        let expected = 6.0 * 25.4 / 180.0 / 100.0;
        assert!((waits[0].as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_cut_is_sent_after_wait() {
        let config = PrintConfig {
            cut_after_feed: true,
            ..small_config()
        };
        let transport = Arc::new(Mutex::new(MemoryTransport::new()));
        let calls_at_wait = Arc::new(Mutex::new(0usize));

        let observed = Arc::clone(&calls_at_wait);
        let watched = Arc::clone(&transport);
        let mut sequencer = PrintJobSequencer::new(config).with_wait(move |_| {
            *observed.lock().unwrap() = watched.lock().unwrap().calls().len();
        });

        // Lock per write so the wait closure can inspect the transport
        struct Shared(Arc<Mutex<MemoryTransport>>);
        impl Transport for Shared {
            fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
                self.0.lock().unwrap().write_bytes(data)
            }
            fn write_text(&mut self, text: &str) -> Result<(), TransportError> {
                self.0.lock().unwrap().write_text(text)
            }
            fn write_raster(&mut self, raster: &MonoRaster) -> Result<(), TransportError> {
                self.0.lock().unwrap().write_raster(raster)
            }
        }

        let mut shared = Shared(Arc::clone(&transport));
        sequencer.submit(&blank_source, &mut shared).unwrap();

        let transport = transport.lock().unwrap();
        assert_eq!(*calls_at_wait.lock().unwrap(), 3);
        assert_eq!(transport.calls().len(), 4);
        assert_eq!(transport.calls()[3], Call::Bytes(vec![0x1D, 0x56, 0x00]));
    }

    #[test]
    fn test_no_feed_text_when_zero_lines() {
        let config = PrintConfig {
            feed_lines: 0,
            ..small_config()
        };
        let mut sequencer = PrintJobSequencer::new(config).with_wait(|_| {});
        let mut transport = MemoryTransport::new();
        sequencer.submit(&blank_source, &mut transport).unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn test_preparation_failure_sends_nothing() {
        let (waits, wait) = recording_wait();
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(wait);
        let mut transport = MemoryTransport::new();
        let missing = |_: &PrintConfig| -> Result<MonoRaster, PrepError> {
            Err(PrepError::SourceMissing("mark.png not found".to_string()))
        };

        let err = sequencer.submit(&missing, &mut transport).unwrap_err();

        assert!(matches!(
            err,
            PrintError::PreparationFailed(PrepError::SourceMissing(_))
        ));
        assert!(transport.calls().is_empty());
        assert!(waits.lock().unwrap().is_empty());
        assert_eq!(sequencer.state(), JobState::Failed);
    }

    #[test]
    fn test_wrong_sized_raster_sends_nothing() {
        let (waits, wait) = recording_wait();
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(wait);
        let mut transport = MemoryTransport::new();
        let undersized =
            |_: &PrintConfig| -> Result<MonoRaster, PrepError> { Ok(MonoRaster::blank(8, 1)) };

        let err = sequencer.submit(&undersized, &mut transport).unwrap_err();

        assert!(matches!(
            err,
            PrintError::PreparationFailed(PrepError::InvalidDimensions {
                width: 8,
                height: 1
            })
        ));
        assert!(transport.calls().is_empty());
        assert!(waits.lock().unwrap().is_empty());
        assert_eq!(sequencer.state(), JobState::Failed);
    }

    #[test]
    fn test_unpadded_raster_is_rejected() {
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(|_| {});
        let mut transport = MemoryTransport::new();
        // Right width, but missing the padding rows
        let unpadded = |config: &PrintConfig| -> Result<MonoRaster, PrepError> {
            Ok(MonoRaster::blank(config.width, config.height))
        };

        let err = sequencer.submit(&unpadded, &mut transport).unwrap_err();

        assert!(matches!(
            err,
            PrintError::PreparationFailed(PrepError::InvalidDimensions { .. })
        ));
        assert!(transport.bytes().is_empty());
    }

    #[test]
    fn test_unrepresentable_feed_time_fails_before_sending() {
        let config = PrintConfig {
            feed_speed_mm_s: 1e-300,
            ..small_config()
        };
        let mut sequencer = PrintJobSequencer::new(config).with_wait(|_| {});
        let mut transport = MemoryTransport::new();

        let err = sequencer.submit(&blank_source, &mut transport).unwrap_err();
        assert!(matches!(err, PrintError::InvalidConfig(_)));
        assert!(transport.bytes().is_empty());
        assert_eq!(sequencer.state(), JobState::Failed);
    }

    #[test]
    fn test_invalid_config_sends_nothing() {
        let config = PrintConfig {
            dpi: 0,
            ..small_config()
        };
        let mut sequencer = PrintJobSequencer::new(config).with_wait(|_| {});
        let mut transport = MemoryTransport::new();

        let err = sequencer.submit(&blank_source, &mut transport).unwrap_err();
        assert!(matches!(err, PrintError::InvalidConfig(_)));
        assert!(transport.bytes().is_empty());
    }

    #[test]
    fn test_raster_failure_reports_and_skips_wait() {
        let (waits, wait) = recording_wait();
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(wait);
        let mut transport = MemoryTransport::failing_raster();

        let err = sequencer.submit(&blank_source, &mut transport).unwrap_err();

        assert!(matches!(
            err,
            PrintError::TransmissionFailed(TransportError::Io(_))
        ));
        // Density went out before the failure
        assert_eq!(transport.calls().len(), 1);
        assert!(waits.lock().unwrap().is_empty());
        assert_eq!(sequencer.state(), JobState::Failed);
    }

    #[test]
    fn test_state_resets_for_next_job() {
        let mut sequencer = PrintJobSequencer::new(small_config()).with_wait(|_| {});

        let mut broken = MemoryTransport::failing_raster();
        assert!(sequencer.submit(&blank_source, &mut broken).is_err());
        assert_eq!(sequencer.state(), JobState::Failed);

        let mut working = MemoryTransport::new();
        sequencer.submit(&blank_source, &mut working).unwrap();
        assert_eq!(sequencer.state(), JobState::Done);
    }

    #[test]
    fn test_custom_density() {
        let config = PrintConfig {
            density: 4,
            break_time: 2,
            ..small_config()
        };
        let mut sequencer = PrintJobSequencer::new(config).with_wait(|_| {});
        let mut transport = MemoryTransport::new();
        sequencer.submit(&blank_source, &mut transport).unwrap();
        assert_eq!(&transport.bytes()[..8], &[0x1D, 0x28, 0x45, 0x03, 0x00, 0x00, 4, 2]);
    }

    #[test]
    fn test_print_job_estimate() {
        let config = PrintConfig::default();
        let job = PrintJob::new(MonoRaster::blank(496, 279), &config).unwrap();
        assert!((job.estimated_feed.as_secs_f64() - 0.3937).abs() < 1e-3);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(JobState::DensitySet.to_string(), "density set");
        assert_eq!(JobState::default(), JobState::Idle);
    }
}
