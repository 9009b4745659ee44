//! # Hotprint CLI
//!
//! Command-line front end for printing a fixed image on a thermal printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print mark.png once on /dev/ttyUSB0 at 9600 baud
//! hotprint print
//!
//! # Print another image on another port, without dithering
//! hotprint print --image logo.png --device /dev/ttyS0 --baud 19200 --no-dither
//!
//! # Save the prepared raster as PNG instead of printing
//! hotprint print --png preview.png
//!
//! # Write the ESC/POS byte stream to a file instead of a printer
//! hotprint print --dump job.bin
//!
//! # Keep the printer open; Enter or "p" prints, "q" quits
//! hotprint listen
//! ```
//!
//! Set `RUST_LOG=debug` to see job state transitions.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use hotprint::{
    HotprintError, PrintConfig,
    job::{PngStaging, PrintJobSequencer},
    render::{self, ImageFile},
    transport::{
        MemoryTransport, SerialTransport,
        serial::{DEFAULT_BAUD, DEFAULT_DEVICE},
    },
};

/// Hotprint - print a fixed image on an ESC/POS thermal printer
#[derive(Parser, Debug)]
#[command(name = "hotprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the image once
    Print {
        #[command(flatten)]
        job: JobArgs,

        /// Save the prepared raster to a PNG file instead of printing
        #[arg(long, value_name = "FILE", conflicts_with = "dump")]
        png: Option<PathBuf>,

        /// Write the ESC/POS byte stream to a file instead of printing
        #[arg(long, value_name = "FILE")]
        dump: Option<PathBuf>,
    },

    /// Keep the printer open and print on request from stdin
    Listen {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Image to print
    #[arg(long, default_value = "mark.png")]
    image: PathBuf,

    /// Printer serial device
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// JSON file with print settings (flags below override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raster width in dots
    #[arg(long)]
    width: Option<u32>,

    /// Image height in dots, before padding
    #[arg(long)]
    height: Option<u32>,

    /// Printer resolution
    #[arg(long)]
    dpi: Option<u16>,

    /// Paper feed speed in mm/s
    #[arg(long)]
    feed_speed: Option<f64>,

    /// Brightness gain
    #[arg(long)]
    brightness: Option<f32>,

    /// Contrast gain
    #[arg(long)]
    contrast: Option<f32>,

    /// Hard threshold instead of Floyd-Steinberg dithering
    #[arg(long)]
    no_dither: bool,

    /// White rows below the image
    #[arg(long)]
    padding_rows: Option<u32>,

    /// Print density level
    #[arg(long)]
    density: Option<u8>,

    /// Inter-line break time
    #[arg(long)]
    break_time: Option<u8>,

    /// Blank lines fed after the image
    #[arg(long)]
    feed_lines: Option<usize>,

    /// Cut the paper once the feed has finished
    #[arg(long)]
    cut: bool,

    /// Directory for the per-job PNG snapshot (defaults to the temp dir)
    #[arg(long, value_name = "DIR")]
    staging_dir: Option<PathBuf>,
}

impl JobArgs {
    /// Config file (or reference values), then flag overrides.
    fn print_config(&self) -> Result<PrintConfig, HotprintError> {
        let mut config = match &self.config {
            Some(path) => PrintConfig::load(path)?,
            None => PrintConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(speed) = self.feed_speed {
            config.feed_speed_mm_s = speed;
        }
        if let Some(brightness) = self.brightness {
            config.brightness = brightness;
        }
        if let Some(contrast) = self.contrast {
            config.contrast = contrast;
        }
        if self.no_dither {
            config.use_dither = false;
        }
        if let Some(rows) = self.padding_rows {
            config.padding_rows = rows;
        }
        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(break_time) = self.break_time {
            config.break_time = break_time;
        }
        if let Some(lines) = self.feed_lines {
            config.feed_lines = lines;
        }
        if self.cut {
            config.cut_after_feed = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn sequencer(&self) -> Result<PrintJobSequencer<PngStaging>, HotprintError> {
        let staging = match &self.staging_dir {
            Some(dir) => PngStaging::new(dir),
            None => PngStaging::in_temp_dir(),
        };
        Ok(PrintJobSequencer::new(self.print_config()?).with_staging(staging))
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), HotprintError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print { job, png, dump } => {
            if let Some(png_path) = png {
                return save_preview(&job, &png_path);
            }
            if let Some(dump_path) = dump {
                return dump_job(&job, &dump_path);
            }
            print_once(&job)
        }
        Commands::Listen { job } => listen(&job),
    }
}

/// Prepare the raster and save it as PNG.
fn save_preview(job: &JobArgs, path: &Path) -> Result<(), HotprintError> {
    let config = job.print_config()?;
    let source = ImageFile::new(&job.image).load()?;
    let raster = render::prepare(&source, &config)?;
    raster.save_png(path)?;
    println!("Saved to {}", path.display());
    Ok(())
}

/// Run a full job against memory and write the bytes out.
fn dump_job(job: &JobArgs, path: &Path) -> Result<(), HotprintError> {
    let mut sequencer = job.sequencer()?.with_wait(|_| {});
    let mut transport = MemoryTransport::new();
    sequencer.submit(&ImageFile::new(&job.image), &mut transport)?;

    let bytes = transport.into_bytes();
    fs::write(path, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn print_once(job: &JobArgs) -> Result<(), HotprintError> {
    let mut sequencer = job.sequencer()?;
    let mut transport = SerialTransport::open(&job.device, job.baud)?;
    sequencer.submit(&ImageFile::new(&job.image), &mut transport)?;
    Ok(())
}

/// Print on request until stdin says quit or closes.
///
/// The printer is opened once up front. If that fails the loop still runs
/// and answers print requests with a notice, so the operator can see why.
fn listen(job: &JobArgs) -> Result<(), HotprintError> {
    let mut sequencer = job.sequencer()?;
    let source = ImageFile::new(&job.image);

    let mut transport = match SerialTransport::open(&job.device, job.baud) {
        Ok(transport) => Some(transport),
        Err(e) => {
            error!("Could not open printer: {}", e);
            None
        }
    };

    println!(
        "Press Enter (or p) to print {}. q to quit.",
        job.image.display()
    );

    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "" | "p" => match transport.as_mut() {
                Some(transport) => {
                    // The sequencer logs failures; the next request starts fresh
                    let _ = sequencer.submit(&source, transport);
                }
                None => println!("Printer not initialized."),
            },
            "q" => break,
            other => println!("Unknown command '{}'. Enter or p prints, q quits.", other),
        }
    }

    // Closes the device
    drop(transport);
    info!("Exited.");
    Ok(())
}
