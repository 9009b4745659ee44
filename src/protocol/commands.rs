//! # ESC/POS Protocol Commands
//!
//! Byte builders for the ESC/POS commands a print job uses.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `GS ( E pL pH fn d1 d2`, `GS V m`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Hex: 0x1D, Decimal: 29. Prefixes graphics, density and cutter commands.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// Clears the print buffer and resets text modes. Density set through
/// `GS ( E` is not affected.
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// DENSITY (GS ( E)
// ============================================================================

/// # Print Density Setting (GS ( E pL pH 0 d1 d2)
///
/// Fixed 8-byte command understood by the printer firmware:
///
/// ```text
/// ┌────────────────┬───────────┬──────────┬─────────┬────────────┐
/// │ 1D 28 45       │ 03 00     │ 00       │ density │ break_time │
/// │ command class  │ pL pH = 3 │ reserved │         │            │
/// └────────────────┴───────────┴──────────┴─────────┴────────────┘
/// ```
///
/// The layout is a compatibility contract and never varies in length.
///
/// ## Example
///
/// ```
/// use hotprint::protocol::commands::DensityCommand;
///
/// let cmd = DensityCommand::default();
/// assert_eq!(cmd.to_bytes(), [0x1D, 0x28, 0x45, 0x03, 0x00, 0x00, 0x01, 0x00]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityCommand {
    /// Density level
    pub density: u8,
    /// Pause between printed lines
    pub break_time: u8,
}

impl DensityCommand {
    /// Total encoded length in bytes.
    pub const LEN: usize = 8;

    pub const fn new(density: u8, break_time: u8) -> Self {
        Self {
            density,
            break_time,
        }
    }

    pub const fn to_bytes(self) -> [u8; Self::LEN] {
        let [pl, ph] = u16_le(3);
        [
            GS,
            b'(',
            b'E',
            pl,
            ph,
            0x00,
            self.density,
            self.break_time,
        ]
    }
}

impl Default for DensityCommand {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

// ============================================================================
// PAPER FEED AND CUT
// ============================================================================

/// # Blank Line Feed
///
/// `count` LF bytes. Pushes the last printed row clear of the head.
#[inline]
pub fn feed_lines(count: usize) -> Vec<u8> {
    vec![LF; count]
}

/// # Full Cut (GS V 0)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS V NUL |
/// | Hex     | 1D 56 00 |
///
/// Cuts at the current paper position. Sending it while the paper is still
/// feeding cuts through the image.
#[inline]
pub fn cut_full() -> Vec<u8> {
    vec![GS, b'V', 0]
}

// ============================================================================
// TEXT
// ============================================================================

/// Encode text for the printer's default code page.
///
/// ASCII passes through. Anything else becomes `?`, which every code page
/// prints the same way.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 as little-endian bytes `[low, high]`.
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================
