//! DeviceLink: the host's single connection to the keyboard.
//!
//! This use case owns everything that touches the HID handle:
//!
//! - **Discovery** – enumerate HID devices and open the first one whose
//!   product name, usage ID and usage page match the [`DeviceFilter`].
//! - **Handshake** – announce the number of screens with a 3-byte report.
//! - **Inbound listener** – a background thread that turns the keyboard's
//!   "show screen N" reports into the shared selected-screen index.
//! - **Push** – send one screen as four 22-byte reports, paced per platform,
//!   with at most one push in flight.  HID writes block, so each one runs on
//!   tokio's blocking pool.
//!
//! The HID library itself sits behind [`HidBackend`] / [`HidConnection`], so
//! the whole state machine runs against an in-memory double in tests.
//!
//! # Connection states (for beginners)
//!
//! ```text
//!              device found + handshake ok
//!   Disconnected ───────────────────────────► Connected
//!        ▲                                        │
//!        └──── write error / read error ──────────┘
//! ```
//!
//! A failed write or a failed listener read clears the handle, so the next
//! tick rediscovers the keyboard instead of writing into a dead handle.  A
//! new handle starts with no last-sent screen, so the selected screen is
//! sent again right after the handshake.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use hidscreen_core::{
    decode_screen_selection, frame_reports, handshake_report,
    protocol::MAX_REPORT_LEN, ProtocolError, Screen,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How long one listener read waits before re-checking the stop flag.
const LISTEN_POLL: Duration = Duration::from_millis(25);

// ── Transport seam ────────────────────────────────────────────────────────────

/// Error type for the HID transport.
#[derive(Debug, Error)]
pub enum HidError {
    #[error("hid backend error: {0}")]
    Backend(String),
    #[error("device disconnected")]
    Disconnected,
}

/// What discovery knows about one HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidDeviceInfo {
    /// Platform path used to open the interface.
    pub path: String,
    pub product: Option<String>,
    pub usage: u16,
    pub usage_page: u16,
}

/// An open HID interface.
///
/// Writes come from the push task while reads come from the listener thread,
/// so implementations must tolerate both at once.
pub trait HidConnection: Send + Sync {
    /// Writes one output report (first byte is the report ID).
    fn write(&self, report: &[u8]) -> Result<usize, HidError>;

    /// Reads one input report into `buf`, waiting at most `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived in time.
    fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, HidError>;
}

/// Platform HID bus access.
pub trait HidBackend: Send + Sync {
    /// Lists every HID interface currently attached.
    fn enumerate(&self) -> Result<Vec<HidDeviceInfo>, HidError>;

    /// Opens the interface described by `device`.
    fn open(&self, device: &HidDeviceInfo) -> Result<Arc<dyn HidConnection>, HidError>;
}

// ── Configuration types ───────────────────────────────────────────────────────

/// Identifies the keyboard's raw-HID interface among all attached devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    pub product_name: String,
    pub usage_id: u16,
    pub usage_page: u16,
}

impl DeviceFilter {
    /// Returns `true` when all three identifying fields match.
    pub fn matches(&self, device: &HidDeviceInfo) -> bool {
        device.product.as_deref() == Some(self.product_name.as_str())
            && device.usage == self.usage_id
            && device.usage_page == self.usage_page
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            product_name: "Lily58".to_string(),
            usage_id: 0x61,
            usage_page: 0xFF60,
        }
    }
}

/// Delays around each of the four frame reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Wait before each report.
    pub pre_delay: Duration,
    /// Wait after each report.
    pub post_delay: Duration,
}

impl PacingPolicy {
    /// The pacing the current OS needs.
    ///
    /// macOS drops reports written back to back, so it waits 100 ms on both
    /// sides of every write.  Everywhere else a 20 ms gap after each write
    /// is enough.
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "macos") {
            Self {
                pre_delay: Duration::from_millis(100),
                post_delay: Duration::from_millis(100),
            }
        } else {
            Self {
                pre_delay: Duration::ZERO,
                post_delay: Duration::from_millis(20),
            }
        }
    }

    /// No delays at all.
    pub fn immediate() -> Self {
        Self {
            pre_delay: Duration::ZERO,
            post_delay: Duration::ZERO,
        }
    }
}

// ── Outcomes and errors ───────────────────────────────────────────────────────

/// Connection state reported after a discovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// What a call to [`DeviceLink::push`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// All four reports were written.
    Sent,
    /// The screen was not exactly 84 characters; nothing written.
    Incomplete,
    /// The screen equals the last one sent; nothing written.
    Unchanged,
    /// Another push is in flight; nothing written.
    Busy,
}

/// Error type for device-link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("hid discovery failed: {0}")]
    Discovery(#[source] HidError),
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: HidError,
    },
    #[error("failed to start listener thread: {0}")]
    Listener(#[from] std::io::Error),
    #[error("handshake write failed: {0}")]
    Handshake(#[source] HidError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("write of line {line} failed: {source}")]
    Write {
        line: usize,
        #[source]
        source: HidError,
    },
    #[error("not connected")]
    NotConnected,
}

// ── Pending-write guard ───────────────────────────────────────────────────────

/// Holds the single-writer flag for the lifetime of one push.
///
/// The flag is cleared on drop, so every exit path (success, early return,
/// write error, task cancellation) releases it.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ── DeviceLink ────────────────────────────────────────────────────────────────

struct ActiveConnection {
    handle: Arc<dyn HidConnection>,
    path: String,
    /// Cleared by the listener on a read error, or by us to stop it.
    alive: Arc<AtomicBool>,
}

impl ActiveConnection {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn shut_down(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// The host-side state machine for one keyboard.
pub struct DeviceLink {
    backend: Arc<dyn HidBackend>,
    filter: DeviceFilter,
    pacing: PacingPolicy,
    screen_count: usize,
    selected: Arc<AtomicUsize>,
    connection: Mutex<Option<ActiveConnection>>,
    pending: AtomicBool,
    last_sent: Mutex<Option<Screen>>,
}

impl DeviceLink {
    /// Creates a disconnected link.  `screen_count` is announced in the
    /// handshake and bounds inbound selections.
    pub fn new(
        backend: Arc<dyn HidBackend>,
        filter: DeviceFilter,
        pacing: PacingPolicy,
        screen_count: usize,
    ) -> Self {
        Self {
            backend,
            filter,
            pacing,
            screen_count,
            selected: Arc::new(AtomicUsize::new(0)),
            connection: Mutex::new(None),
            pending: AtomicBool::new(false),
            last_sent: Mutex::new(None),
        }
    }

    pub fn screen_count(&self) -> usize {
        self.screen_count
    }

    /// Index of the screen the keyboard asked for most recently.
    pub fn selected_index(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    /// Returns `true` while a push is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Returns `true` if a live handle is held.
    pub async fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(ActiveConnection::is_alive)
    }

    /// The screen most recently delivered in full over the current handle.
    pub async fn last_sent(&self) -> Option<Screen> {
        self.last_sent.lock().await.clone()
    }

    /// Makes sure a live handle is held, discovering the keyboard if not.
    ///
    /// When connected already this is a no-op.  Otherwise the first device
    /// matching the filter is opened, the listener is started and the
    /// handshake is written.  No matching device is not an error: the link
    /// simply stays [`LinkState::Disconnected`] until a later call.
    pub async fn ensure_connected(&self) -> Result<LinkState, LinkError> {
        let mut slot = self.connection.lock().await;

        if let Some(active) = slot.as_ref() {
            if active.is_alive() {
                return Ok(LinkState::Connected);
            }
            warn!(path = %active.path, "keyboard connection lost, rediscovering");
            *slot = None;
        }

        let devices = self.backend.enumerate().map_err(LinkError::Discovery)?;
        let Some(device) = devices.into_iter().find(|d| self.filter.matches(d)) else {
            debug!(product = %self.filter.product_name, "keyboard not found");
            return Ok(LinkState::Disconnected);
        };

        let handshake = handshake_report(self.screen_count)?;
        let handle = self.backend.open(&device).map_err(|source| LinkError::Open {
            path: device.path.clone(),
            source,
        })?;

        let alive = Arc::new(AtomicBool::new(true));
        spawn_listener(
            Arc::clone(&handle),
            Arc::clone(&self.selected),
            Arc::clone(&alive),
            self.screen_count,
        )?;

        if let Err(e) = write_blocking(&handle, handshake).await {
            alive.store(false, Ordering::Release);
            return Err(LinkError::Handshake(e));
        }

        info!(path = %device.path, screens = self.screen_count, "connected to keyboard");
        // A fresh handle has shown nothing yet.
        *self.last_sent.lock().await = None;
        *slot = Some(ActiveConnection {
            handle,
            path: device.path,
            alive,
        });
        Ok(LinkState::Connected)
    }

    /// Applies one inbound report to the selected index.
    ///
    /// This is what the listener thread does with every report it reads.
    /// Returns the new index, or `None` if the report was ignored.
    pub fn handle_inbound_report(&self, report: &[u8]) -> Option<usize> {
        apply_selection(report, &self.selected, self.screen_count)
    }

    /// Returns `true` if `screen` is complete, differs from the last screen
    /// sent, and no push is in flight.
    pub async fn should_push(&self, screen: &Screen) -> bool {
        if !screen.is_complete() || self.is_pending() {
            return false;
        }
        self.last_sent.lock().await.as_ref() != Some(screen)
    }

    /// Sends `screen` to the keyboard as four paced reports.
    ///
    /// Incomplete, unchanged and concurrent pushes are no-ops reported via
    /// [`PushOutcome`].  The last-sent screen is updated only after all four
    /// writes succeed.  A write error drops the handle and releases the
    /// pending flag.
    pub async fn push(&self, screen: &Screen) -> Result<PushOutcome, LinkError> {
        if !screen.is_complete() {
            return Ok(PushOutcome::Incomplete);
        }
        let Some(_guard) = PendingGuard::acquire(&self.pending) else {
            return Ok(PushOutcome::Busy);
        };
        if self.last_sent.lock().await.as_ref() == Some(screen) {
            return Ok(PushOutcome::Unchanged);
        }

        let reports = frame_reports(screen)?;
        let handle = self
            .connection
            .lock()
            .await
            .as_ref()
            .filter(|active| active.is_alive())
            .map(|active| Arc::clone(&active.handle))
            .ok_or(LinkError::NotConnected)?;

        for (line, report) in reports.iter().enumerate() {
            pause(self.pacing.pre_delay).await;
            if let Err(source) = write_blocking(&handle, *report).await {
                self.drop_connection().await;
                return Err(LinkError::Write { line, source });
            }
            pause(self.pacing.post_delay).await;
        }

        *self.last_sent.lock().await = Some(screen.clone());
        debug!(selected = self.selected_index(), "screen sent");
        Ok(PushOutcome::Sent)
    }

    async fn drop_connection(&self) {
        if let Some(active) = self.connection.lock().await.take() {
            active.shut_down();
            warn!(path = %active.path, "dropped keyboard handle after write error");
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        // Stops the listener thread.
        if let Some(active) = self.connection.get_mut().take() {
            active.shut_down();
        }
    }
}

/// Runs one HID write on the blocking pool so a slow device never stalls a
/// runtime worker.
async fn write_blocking<R>(handle: &Arc<dyn HidConnection>, report: R) -> Result<usize, HidError>
where
    R: AsRef<[u8]> + Send + 'static,
{
    let handle = Arc::clone(handle);
    tokio::task::spawn_blocking(move || handle.write(report.as_ref()))
        .await
        .unwrap_or_else(|e| Err(HidError::Backend(format!("write task failed: {e}"))))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn apply_selection(report: &[u8], selected: &AtomicUsize, screen_count: usize) -> Option<usize> {
    match decode_screen_selection(report, screen_count) {
        Some(index) => {
            selected.store(index, Ordering::Release);
            info!(index, "keyboard selected screen");
            Some(index)
        }
        None => {
            debug!(first = ?report.first(), "ignoring inbound report");
            None
        }
    }
}

fn spawn_listener(
    handle: Arc<dyn HidConnection>,
    selected: Arc<AtomicUsize>,
    alive: Arc<AtomicBool>,
    screen_count: usize,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name("hidscreen-listener".to_string())
        .spawn(move || {
            let mut buf = [0u8; MAX_REPORT_LEN];
            while alive.load(Ordering::Acquire) {
                match handle.read_timeout(&mut buf, LISTEN_POLL) {
                    Ok(0) => {}
                    Ok(n) => {
                        apply_selection(&buf[..n], &selected, screen_count);
                    }
                    Err(e) => {
                        warn!("keyboard read failed: {e}");
                        alive.store(false, Ordering::Release);
                    }
                }
            }
            debug!("listener stopped");
        })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::hid::mock::MockHidBackend;

    fn complete_screen(fill: char) -> Screen {
        Screen::new(fill.to_string().repeat(84))
    }

    fn link_with(backend: Arc<MockHidBackend>) -> DeviceLink {
        DeviceLink::new(
            backend,
            DeviceFilter::default(),
            PacingPolicy::immediate(),
            3,
        )
    }

    #[test]
    fn test_filter_requires_all_three_fields() {
        let filter = DeviceFilter::default();
        let mut device = MockHidBackend::keyboard_info();
        assert!(filter.matches(&device));

        device.usage = 0x06;
        assert!(!filter.matches(&device));

        let mut device = MockHidBackend::keyboard_info();
        device.product = Some("Corne".to_string());
        assert!(!filter.matches(&device));

        let mut device = MockHidBackend::keyboard_info();
        device.product = None;
        assert!(!filter.matches(&device));
    }

    #[test]
    fn test_pending_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = PendingGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(PendingGuard::acquire(&flag).is_none());
        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(PendingGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_platform_pacing() {
        let pacing = PacingPolicy::for_current_platform();
        if cfg!(target_os = "macos") {
            assert_eq!(pacing.pre_delay, Duration::from_millis(100));
            assert_eq!(pacing.post_delay, Duration::from_millis(100));
        } else {
            assert_eq!(pacing.pre_delay, Duration::ZERO);
            assert_eq!(pacing.post_delay, Duration::from_millis(20));
        }
    }

    #[tokio::test]
    async fn test_ensure_connected_stays_disconnected_without_device() {
        // Arrange
        let backend = Arc::new(MockHidBackend::empty());
        let link = link_with(Arc::clone(&backend));

        // Act / Assert
        for _ in 0..5 {
            assert_eq!(link.ensure_connected().await.unwrap(), LinkState::Disconnected);
        }
        assert!(!link.is_connected().await);
        assert_eq!(backend.open_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_connected_writes_handshake_once() {
        // Arrange
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));

        // Act
        assert_eq!(link.ensure_connected().await.unwrap(), LinkState::Connected);
        assert_eq!(link.ensure_connected().await.unwrap(), LinkState::Connected);

        // Assert
        assert_eq!(backend.open_count(), 1);
        let conn = backend.connection(0).unwrap();
        assert_eq!(conn.written(), vec![vec![0x00, 0x01, 0x03]]);
    }

    #[tokio::test]
    async fn test_handshake_failure_leaves_link_disconnected() {
        let backend = Arc::new(MockHidBackend::with_keyboard());
        backend.fail_next_open_writes();
        let link = link_with(Arc::clone(&backend));

        let result = link.ensure_connected().await;

        assert!(matches!(result, Err(LinkError::Handshake(_))));
        assert!(!link.is_connected().await);
    }

    #[tokio::test]
    async fn test_push_incomplete_screen_is_noop() {
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();

        let outcome = link.push(&Screen::new("short")).await.unwrap();

        assert_eq!(outcome, PushOutcome::Incomplete);
        assert!(!link.is_pending());
        assert_eq!(backend.connection(0).unwrap().written().len(), 1);
        assert_eq!(link.last_sent().await, None);
    }

    #[tokio::test]
    async fn test_push_writes_four_reports_then_records_screen() {
        // Arrange
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();
        let screen = complete_screen('a');

        // Act
        let outcome = link.push(&screen).await.unwrap();

        // Assert
        assert_eq!(outcome, PushOutcome::Sent);
        let written = backend.connection(0).unwrap().written();
        let frames = &written[1..];
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|r| r.len() == 22 && r[0] == 0x00));
        assert_eq!(link.last_sent().await, Some(screen.clone()));
        assert!(!link.is_pending());

        // Same screen again is a no-op.
        assert_eq!(link.push(&screen).await.unwrap(), PushOutcome::Unchanged);
        assert_eq!(backend.connection(0).unwrap().written().len(), 5);
    }

    #[tokio::test]
    async fn test_push_without_connection_fails() {
        let link = link_with(Arc::new(MockHidBackend::empty()));

        let result = link.push(&complete_screen('a')).await;

        assert!(matches!(result, Err(LinkError::NotConnected)));
        assert!(!link.is_pending());
    }

    #[tokio::test]
    async fn test_write_failure_releases_pending_and_clears_handle() {
        // Arrange
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();
        backend.connection(0).unwrap().set_fail_writes(true);

        // Act
        let result = link.push(&complete_screen('a')).await;

        // Assert
        assert!(matches!(result, Err(LinkError::Write { line: 0, .. })));
        assert!(!link.is_pending());
        assert!(!link.is_connected().await);
        assert_eq!(link.last_sent().await, None);

        // The next discovery opens a fresh handle.
        assert_eq!(link.ensure_connected().await.unwrap(), LinkState::Connected);
        assert_eq!(backend.open_count(), 2);
    }

    #[tokio::test]
    async fn test_reconnect_forgets_last_sent_screen() {
        // Arrange
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();
        let screen = complete_screen('a');
        link.push(&screen).await.unwrap();
        backend.connection(0).unwrap().set_fail_writes(true);
        assert!(link.push(&complete_screen('b')).await.is_err());

        // Act
        link.ensure_connected().await.unwrap();

        // Assert
        assert_eq!(link.last_sent().await, None);
        assert!(link.should_push(&screen).await);
    }

    #[tokio::test]
    async fn test_slow_writes_leave_the_runtime_free() {
        // Arrange: single-threaded runtime, 4 x 40 ms writes.
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();
        backend
            .connection(0)
            .unwrap()
            .set_write_delay(Duration::from_millis(40));
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        // Act
        let outcome = link.push(&complete_screen('s')).await.unwrap();
        ticker.abort();

        // Assert
        assert_eq!(outcome, PushOutcome::Sent);
        assert!(ticks.load(Ordering::SeqCst) >= 5, "runtime stalled during writes");
    }

    #[tokio::test]
    async fn test_writes_progress_while_listener_reads() {
        // Arrange: every read attempt holds the shared I/O lock.
        let backend = Arc::new(MockHidBackend::with_keyboard());
        let link = link_with(Arc::clone(&backend));
        link.ensure_connected().await.unwrap();
        backend
            .connection(0)
            .unwrap()
            .set_read_hold(Duration::from_millis(5));

        // Act
        let outcome = tokio::time::timeout(Duration::from_secs(2), link.push(&complete_screen('r')))
            .await
            .expect("push starved by the listener")
            .unwrap();

        // Assert
        assert_eq!(outcome, PushOutcome::Sent);
        assert_eq!(backend.connection(0).unwrap().written().len(), 1 + 4);
        assert!(link.is_connected().await);
    }

    #[test]
    fn test_handle_inbound_report_updates_selection() {
        let link = link_with(Arc::new(MockHidBackend::empty()));

        assert_eq!(link.handle_inbound_report(&[2]), Some(1));
        assert_eq!(link.selected_index(), 1);

        assert_eq!(link.handle_inbound_report(&[5]), None);
        assert_eq!(link.handle_inbound_report(&[0]), None);
        assert_eq!(link.handle_inbound_report(&[]), None);
        assert_eq!(link.selected_index(), 1);

        assert_eq!(link.handle_inbound_report(&[3, 0, 0]), Some(2));
        assert_eq!(link.selected_index(), 2);
    }
}
