//! hidapi-backed HID transport.
//!
//! Compiled with the `native-hid` feature (a default feature).  `HidApi`
//! keeps its own device list, so enumeration refreshes it under a lock
//! first.  An open `HidDevice` is `Send` but not `Sync`; the listener thread
//! and the push task share it through a mutex.  Handles are opened in
//! non-blocking mode so a read holds the mutex only for one `hid_read` call,
//! and the wait between reads happens with the mutex released.

use std::{ffi::CString, sync::Arc, sync::Mutex, time::Duration};

use hidapi::{HidApi, HidDevice};

use super::poll_read;
use crate::application::device_link::{HidBackend, HidConnection, HidDeviceInfo, HidError};

fn backend_error(e: impl std::fmt::Display) -> HidError {
    HidError::Backend(e.to_string())
}

/// [`HidBackend`] over the system HID stack.
pub struct HidApiBackend {
    api: Mutex<HidApi>,
}

impl HidApiBackend {
    pub fn new() -> Result<Self, HidError> {
        let api = HidApi::new().map_err(backend_error)?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl HidBackend for HidApiBackend {
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, HidError> {
        let mut api = self
            .api
            .lock()
            .map_err(|_| backend_error("hid api lock poisoned"))?;
        api.refresh_devices().map_err(backend_error)?;
        Ok(api
            .device_list()
            .map(|d| HidDeviceInfo {
                path: d.path().to_string_lossy().into_owned(),
                product: d.product_string().map(str::to_string),
                usage: d.usage(),
                usage_page: d.usage_page(),
            })
            .collect())
    }

    fn open(&self, device: &HidDeviceInfo) -> Result<Arc<dyn HidConnection>, HidError> {
        let path = CString::new(device.path.as_str()).map_err(backend_error)?;
        let api = self
            .api
            .lock()
            .map_err(|_| backend_error("hid api lock poisoned"))?;
        let handle = api.open_path(&path).map_err(backend_error)?;
        handle.set_blocking_mode(false).map_err(backend_error)?;
        Ok(Arc::new(HidApiConnection {
            device: Mutex::new(handle),
        }))
    }
}

struct HidApiConnection {
    device: Mutex<HidDevice>,
}

impl HidConnection for HidApiConnection {
    fn write(&self, report: &[u8]) -> Result<usize, HidError> {
        let device = self.device.lock().map_err(|_| HidError::Disconnected)?;
        device.write(report).map_err(backend_error)
    }

    fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError> {
        poll_read(timeout, || {
            let device = self.device.lock().map_err(|_| HidError::Disconnected)?;
            device.read(&mut buf[..]).map_err(backend_error)
        })
    }
}
