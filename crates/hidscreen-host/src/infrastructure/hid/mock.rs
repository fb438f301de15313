//! In-memory HID backend for tests.
//!
//! # Why a mock backend?
//!
//! The real backend needs a keyboard plugged into the test machine.  The
//! `MockHidBackend` instead serves a fixed device list and hands out
//! [`MockHidConnection`]s that:
//!
//! - Record every report written, in order.
//! - Return queued inbound reports from `read_timeout`, as if the keyboard
//!   had sent them.
//! - Fail writes or reads on demand, to drive the reconnect paths.
//! - Share one I/O lock between reads and writes, like a real device handle,
//!   and optionally hold it for a while on every read attempt or write.
//!
//! # Usage in tests
//!
//! ```ignore
//! let backend = Arc::new(MockHidBackend::with_keyboard());
//! let link = DeviceLink::new(Arc::clone(&backend), DeviceFilter::default(),
//!                            PacingPolicy::immediate(), 3);
//! link.ensure_connected().await?;
//!
//! let conn = backend.connection(0).unwrap();
//! assert_eq!(conn.written()[0], vec![0x00, 0x01, 0x03]);
//! ```

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use super::poll_read;
use crate::application::device_link::{HidBackend, HidConnection, HidDeviceInfo, HidError};

/// A recording HID interface.
#[derive(Default)]
pub struct MockHidConnection {
    written: Mutex<Vec<Vec<u8>>>,
    inbound: Mutex<VecDeque<Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    /// Stands in for the device handle both directions contend for.
    io: Mutex<()>,
    read_hold: Mutex<Duration>,
    write_delay: Mutex<Duration>,
}

impl MockHidConnection {
    /// Every report written so far, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }

    /// Queues a report for the listener to read.
    pub fn push_inbound(&self, report: &[u8]) {
        self.inbound.lock().unwrap().push_back(report.to_vec());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes the next read fail, as an unplugged keyboard would.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Every read attempt holds the I/O lock for `hold`.
    pub fn set_read_hold(&self, hold: Duration) {
        *self.read_hold.lock().unwrap() = hold;
    }

    /// Every write blocks the calling thread for `delay`.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }
}

impl HidConnection for MockHidConnection {
    fn write(&self, report: &[u8]) -> Result<usize, HidError> {
        let _io = self.io.lock().unwrap();
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HidError::Backend("mock write failure".to_string()));
        }
        self.written.lock().unwrap().push(report.to_vec());
        Ok(report.len())
    }

    fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError> {
        poll_read(timeout, || {
            let _io = self.io.lock().unwrap();
            let hold = *self.read_hold.lock().unwrap();
            if !hold.is_zero() {
                std::thread::sleep(hold);
            }
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(HidError::Disconnected);
            }
            let Some(report) = self.inbound.lock().unwrap().pop_front() else {
                return Ok(0);
            };
            let n = report.len().min(buf.len());
            buf[..n].copy_from_slice(&report[..n]);
            Ok(n)
        })
    }
}

/// A fixed device list plus every connection opened from it.
#[derive(Default)]
pub struct MockHidBackend {
    devices: Mutex<Vec<HidDeviceInfo>>,
    connections: Mutex<Vec<Arc<MockHidConnection>>>,
    fail_enumerate: AtomicBool,
    fail_new_writes: AtomicBool,
}

impl MockHidBackend {
    /// A bus with nothing attached.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A bus with the default keyboard interface plus an unrelated device.
    pub fn with_keyboard() -> Self {
        let backend = Self::default();
        backend.attach(HidDeviceInfo {
            path: "mock://mouse".to_string(),
            product: Some("Mouse".to_string()),
            usage: 0x02,
            usage_page: 0x01,
        });
        backend.attach(Self::keyboard_info());
        backend
    }

    /// The interface [`DeviceFilter::default`](crate::application::device_link::DeviceFilter)
    /// matches.
    pub fn keyboard_info() -> HidDeviceInfo {
        HidDeviceInfo {
            path: "mock://lily58".to_string(),
            product: Some("Lily58".to_string()),
            usage: 0x61,
            usage_page: 0xFF60,
        }
    }

    /// Plugs in a device.
    pub fn attach(&self, device: HidDeviceInfo) {
        self.devices.lock().unwrap().push(device);
    }

    /// Unplugs every device.
    pub fn detach_all(&self) {
        self.devices.lock().unwrap().clear();
    }

    pub fn set_fail_enumerate(&self, fail: bool) {
        self.fail_enumerate.store(fail, Ordering::SeqCst);
    }

    /// Connections opened after this call reject every write.
    pub fn fail_next_open_writes(&self) {
        self.fail_new_writes.store(true, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// The `index`-th connection opened.
    pub fn connection(&self, index: usize) -> Option<Arc<MockHidConnection>> {
        self.connections.lock().unwrap().get(index).cloned()
    }
}

impl HidBackend for MockHidBackend {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, HidError> {
        if self.fail_enumerate.load(Ordering::SeqCst) {
            return Err(HidError::Backend("mock enumerate failure".to_string()));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    fn open(&self, _device: &HidDeviceInfo) -> Result<Arc<dyn HidConnection>, HidError> {
        let conn = Arc::new(MockHidConnection::default());
        conn.set_fail_writes(self.fail_new_writes.load(Ordering::SeqCst));
        self.connections.lock().unwrap().push(Arc::clone(&conn));
        Ok(conn)
    }
}
