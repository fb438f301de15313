//! hidscreen-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the host do? (for beginners)
//!
//! A split keyboard with a small OLED panel cannot fetch stock prices or read
//! the computer's CPU load by itself.  The host process does that work and
//! streams ready-made text frames to the keyboard:
//!
//! 1. Every second, each *monitor source* (performance, stocks, weather)
//!    produces its latest 84-character screen.
//! 2. The *device link* finds the keyboard on the HID bus (reconnecting when
//!    it is unplugged) and listens for the keyboard's "show screen N" reports.
//! 3. If the selected screen changed since it was last sent, the device link
//!    writes it to the keyboard as four 22-byte reports.
//!
//! The *scheduler* drives those three steps on a fixed interval.

/// Application layer: use cases and the traits they depend on.
pub mod application;

/// Infrastructure layer: HID, OS, network adapters and settings.
pub mod infrastructure;
