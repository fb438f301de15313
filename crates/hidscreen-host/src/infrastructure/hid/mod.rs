//! HID transport adapters.
//!
//! - `native` – hidapi, behind the `native-hid` feature (on by default).
//! - `mock` – in-memory double used by the tests.
//!
//! Both backends share one device handle between the listener thread and the
//! push path.  Reads therefore never wait while holding that handle: each
//! attempt is non-blocking, and [`poll_read`] sleeps between attempts with
//! the handle released so a pending write can take it.

use std::{
    thread,
    time::{Duration, Instant},
};

use crate::application::device_link::HidError;

pub mod mock;

#[cfg(feature = "native-hid")]
pub mod native;

/// Gap between two read attempts.
pub const READ_POLL_STEP: Duration = Duration::from_millis(2);

/// Repeats the non-blocking `attempt` until it returns data or fails, or
/// until `timeout` passes.
///
/// Returns `Ok(0)` on timeout.  `attempt` returning `Ok(0)` means "nothing
/// yet".
pub fn poll_read(
    timeout: Duration,
    mut attempt: impl FnMut() -> Result<usize, HidError>,
) -> Result<usize, HidError> {
    let deadline = Instant::now() + timeout;
    loop {
        let n = attempt()?;
        if n > 0 {
            return Ok(n);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(0);
        }
        thread::sleep(READ_POLL_STEP.min(deadline - now));
    }
}
