//! Raw HID report encoding for the keyboard's OLED channel.
//!
//! Wire format (host → keyboard):
//! ```text
//! handshake: [0x00][0x01][screen_count]
//! frame:     [0x00][21 font bytes]          × 4, lines 0..3 in order
//! ```
//! Wire format (keyboard → host):
//! ```text
//! selection: [screen_number][...ignored]    1 <= screen_number <= screen_count
//! ```
//!
//! # Why a leading zero byte? (for beginners)
//!
//! HID reports may start with a *report ID*.  The keyboard's raw-HID
//! interface does not use report IDs, but the host HID stack on Windows
//! still strips the first byte of every outgoing report.  Sending a `0`
//! there keeps the payload intact on every platform.
//!
//! # Why split a frame into four reports?
//!
//! The raw-HID endpoint carries at most 32 bytes per report, so an 84-byte
//! frame cannot travel in one.  Splitting on line boundaries (21 bytes) also
//! lets the keyboard buffer one line at a time before forwarding the whole
//! frame to the other half of the split board.

use thiserror::Error;

use crate::screen::{Screen, ScreenError, LINE_COUNT, LINE_WIDTH};

/// Reserved first byte of every outgoing report.
pub const REPORT_ID: u8 = 0x00;

/// Second handshake byte: "a new host connection has started".
pub const CONNECT_MARKER: u8 = 0x01;

/// Largest report the raw-HID endpoint accepts.
pub const MAX_REPORT_LEN: usize = 32;

/// Length of the handshake report.
pub const HANDSHAKE_LEN: usize = 3;

/// Length of one frame report: the reserved byte plus one display line.
pub const FRAME_REPORT_LEN: usize = 1 + LINE_WIDTH;

/// One outgoing frame report.
pub type FrameReport = [u8; FRAME_REPORT_LEN];

/// Errors raised while building outgoing reports.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The screen could not be converted to font bytes.
    #[error("screen cannot be encoded: {0}")]
    Screen(#[from] ScreenError),

    /// The handshake carries the screen count in a single byte.
    #[error("screen count {0} does not fit in the handshake report")]
    TooManyScreens(usize),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Builds the one-time handshake sent right after a connection opens.
///
/// # Errors
///
/// Returns [`ProtocolError::TooManyScreens`] if `screen_count` exceeds 255.
pub fn handshake_report(screen_count: usize) -> Result<[u8; HANDSHAKE_LEN], ProtocolError> {
    let count = u8::try_from(screen_count).map_err(|_| ProtocolError::TooManyScreens(screen_count))?;
    Ok([REPORT_ID, CONNECT_MARKER, count])
}

/// Splits a complete screen into the four frame reports, line 0 first.
///
/// # Errors
///
/// Returns [`ProtocolError::Screen`] if the screen is incomplete or holds a
/// character without a one-byte font code.
pub fn frame_reports(screen: &Screen) -> Result<[FrameReport; LINE_COUNT], ProtocolError> {
    let bytes = screen.encode()?;

    let mut reports = [[REPORT_ID; FRAME_REPORT_LEN]; LINE_COUNT];
    for (report, line) in reports.iter_mut().zip(bytes.chunks_exact(LINE_WIDTH)) {
        report[1..].copy_from_slice(line);
    }
    Ok(reports)
}

/// Decodes an inbound report into a zero-based screen index.
///
/// Returns `Some(b - 1)` when the first byte `b` satisfies
/// `1 <= b <= screen_count`, and `None` for an empty report, a zero byte, or
/// an out-of-range number.  Out-of-range values are ignored, not clamped.
pub fn decode_screen_selection(report: &[u8], screen_count: usize) -> Option<usize> {
    let number = usize::from(*report.first()?);
    if (1..=screen_count).contains(&number) {
        Some(number - 1)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
