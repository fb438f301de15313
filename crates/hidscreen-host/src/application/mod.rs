//! Application layer use cases for the host.
//!
//! # What use cases does the host have?
//!
//! - **`device_link`** – Owns the keyboard connection: discovery, the
//!   handshake, the inbound screen-selection listener, and the paced
//!   four-report write with its single-writer guard.  The HID library is
//!   reached only through the [`device_link::HidBackend`] trait.
//!
//! - **`monitors`** – The three screen producers (performance, stocks,
//!   weather).  Each wraps a data-fetching trait implemented in the
//!   infrastructure layer and decides its own refresh cadence and fallback.
//!
//! - **`scheduler`** – The periodic tick that refreshes every source, keeps
//!   the device link connected, and pushes the selected screen.

pub mod device_link;
pub mod monitors;
pub mod scheduler;
