//! HID report layout shared by the host and the keyboard firmware.
//!
//! Sub-modules:
//! - `report` – builds the handshake and frame reports, and decodes the
//!   keyboard's screen-selection reports.

pub mod report;

pub use report::{
    decode_screen_selection, frame_reports, handshake_report, FrameReport, ProtocolError,
    CONNECT_MARKER, FRAME_REPORT_LEN, HANDSHAKE_LEN, MAX_REPORT_LEN, REPORT_ID,
};
