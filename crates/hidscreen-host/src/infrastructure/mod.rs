//! Infrastructure layer: adapters for the outside world.
//!
//! - `hid` – HID bus access ([`HidBackend`](crate::application::device_link::HidBackend)).
//! - `system` – CPU, memory, volume and battery readings.
//! - `web` – quote and weather page scrapers.
//! - `config` – TOML settings.

pub mod config;
pub mod hid;
pub mod system;
pub mod web;
