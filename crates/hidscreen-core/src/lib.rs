//! # hidscreen-core
//!
//! Shared library for hidscreen containing the screen model, the three screen
//! renderers, the title-glyph table, and the HID report encoding used to talk
//! to the keyboard firmware.
//!
//! It has zero dependencies on OS APIs, HID libraries, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! hidscreen drives the small OLED panel on a split keyboard.  The panel shows
//! one of several "screens" (system performance, stock prices, weather) and the
//! keyboard tells the host which one it wants.  Every screen is exactly 84
//! characters: 4 lines of 21 columns.
//!
//! This crate (`hidscreen-core`) is the pure foundation.  It defines:
//!
//! - **`screen`** – The [`Screen`] value type plus the renderers that turn
//!   source data (percentages, prices, weather fields) into a fixed-width
//!   84-character frame with the font's title glyphs embedded.
//!
//! - **`protocol`** – How a screen travels over HID.  A frame is split into four
//!   22-byte reports (one reserved byte + 21 characters) and the keyboard sends
//!   back one-byte reports selecting a screen.
//!
//! - **`registry`** – The fixed-length table holding the latest screen for each
//!   source index.

pub mod protocol;
pub mod registry;
pub mod screen;

// Re-export the most-used types at the crate root so callers can write
// `hidscreen_core::Screen` instead of `hidscreen_core::screen::Screen`.
pub use protocol::report::{
    decode_screen_selection, frame_reports, handshake_report, FrameReport, ProtocolError,
};
pub use registry::{RegistryError, ScreenRegistry};
pub use screen::format::{
    format_performance_screen, format_stock_screen, format_weather_screen, FormatError, PerfStat,
    WeatherFields,
};
pub use screen::glyph::title_glyph;
pub use screen::scroll::DescriptionScroller;
pub use screen::{Screen, ScreenError, ScreenKind, LINE_COUNT, LINE_WIDTH, SCREEN_LEN};
