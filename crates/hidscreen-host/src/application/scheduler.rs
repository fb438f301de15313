//! Scheduler: the once-per-interval refresh and push loop.
//!
//! Each tick:
//!
//! 1. Every [`MonitorSource`] produces its next screen, all concurrently.
//!    Results land in the [`ScreenRegistry`] at the source's index.  A
//!    source that errors keeps its previous registry entry.
//! 2. The [`DeviceLink`] is asked to connect if it is not already.
//! 3. If connected, the screen at the keyboard's selected index is pushed
//!    on a spawned task, unless it is incomplete, unchanged, or another push
//!    is still running.
//!
//! The push is spawned rather than awaited so a slow (paced) write never
//! delays the next refresh.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::future::join_all;
use hidscreen_core::ScreenRegistry;
use thiserror::Error;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, warn};

use super::device_link::{DeviceLink, LinkError, LinkState, PushOutcome};
use super::monitors::MonitorSource;

/// Error type for building a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("device link announces {link} screens but {sources} sources are registered")]
    ScreenCountMismatch { link: usize, sources: usize },
    #[error("tick interval must be non-zero")]
    ZeroInterval,
}

/// What one tick did.
#[derive(Debug)]
pub struct TickReport {
    pub state: LinkState,
    /// The spawned push, if one was started.
    pub push: Option<JoinHandle<Result<PushOutcome, LinkError>>>,
}

/// Drives the monitor sources and the device link.
pub struct Scheduler {
    sources: Vec<Box<dyn MonitorSource>>,
    registry: ScreenRegistry,
    link: Arc<DeviceLink>,
    interval: Duration,
}

impl Scheduler {
    /// Registers `sources` in order; source `i` fills registry slot `i`.
    pub fn new(
        sources: Vec<Box<dyn MonitorSource>>,
        link: Arc<DeviceLink>,
        interval: Duration,
    ) -> Result<Self, SchedulerError> {
        if link.screen_count() != sources.len() {
            return Err(SchedulerError::ScreenCountMismatch {
                link: link.screen_count(),
                sources: sources.len(),
            });
        }
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        Ok(Self {
            registry: ScreenRegistry::new(sources.len()),
            sources,
            link,
            interval,
        })
    }

    pub fn registry(&self) -> &ScreenRegistry {
        &self.registry
    }

    /// Runs one refresh, connect and push cycle.
    pub async fn tick(&mut self) -> TickReport {
        self.refresh_sources().await;

        let state = match self.link.ensure_connected().await {
            Ok(state) => state,
            Err(e) => {
                warn!("keyboard connection attempt failed: {e}");
                LinkState::Disconnected
            }
        };

        let push = match state {
            LinkState::Connected => self.dispatch_push().await,
            LinkState::Disconnected => None,
        };

        TickReport { state, push }
    }

    /// Ticks every interval until `running` is cleared.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.interval.as_millis() as u64,
            sources = self.sources.len(),
            "scheduler started"
        );

        while running.load(Ordering::SeqCst) {
            ticker.tick().await;
            self.tick().await;
        }
        info!("scheduler stopped");
    }

    async fn refresh_sources(&mut self) {
        let results = join_all(self.sources.iter_mut().map(|s| s.produce_next_screen())).await;

        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(screen) => {
                    if let Err(e) = self.registry.set(index, screen) {
                        error!("registry rejected screen: {e}");
                    }
                }
                Err(e) => {
                    let kind = self.sources[index].kind();
                    warn!(?kind, "source failed, keeping previous screen: {e}");
                }
            }
        }
    }

    async fn dispatch_push(&mut self) -> Option<JoinHandle<Result<PushOutcome, LinkError>>> {
        let index = self.link.selected_index();
        let screen = self.registry.get(index)?.clone();
        if !self.link.should_push(&screen).await {
            return None;
        }

        let link = Arc::clone(&self.link);
        Some(tokio::spawn(async move {
            let result = link.push(&screen).await;
            if let Err(e) = &result {
                error!(index, "screen push failed: {e}");
            }
            result
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device_link::{DeviceFilter, PacingPolicy};
    use crate::application::monitors::MonitorError;
    use crate::infrastructure::hid::mock::MockHidBackend;
    use async_trait::async_trait;
    use hidscreen_core::{FormatError, Screen, ScreenKind};

    /// A source that returns a fixed screen, or fails once it runs out.
    struct FixedSource {
        screens: Vec<Screen>,
        calls: usize,
    }

    #[async_trait]
    impl MonitorSource for FixedSource {
        fn kind(&self) -> ScreenKind {
            ScreenKind::Performance
        }

        async fn produce_next_screen(&mut self) -> Result<Screen, MonitorError> {
            let result = self.screens.get(self.calls).cloned().ok_or(MonitorError::Format(
                FormatError::LineCount {
                    expected: 4,
                    actual: 0,
                },
            ));
            self.calls += 1;
            result
        }
    }

    fn link(backend: Arc<MockHidBackend>, screens: usize) -> Arc<DeviceLink> {
        Arc::new(DeviceLink::new(
            backend,
            DeviceFilter::default(),
            PacingPolicy::immediate(),
            screens,
        ))
    }

    #[test]
    fn test_new_rejects_mismatched_screen_count() {
        let sources: Vec<Box<dyn MonitorSource>> = vec![Box::new(FixedSource {
            screens: vec![],
            calls: 0,
        })];
        let result = Scheduler::new(
            sources,
            link(Arc::new(MockHidBackend::empty()), 3),
            Duration::from_secs(1),
        );
        assert!(matches!(
            result,
            Err(SchedulerError::ScreenCountMismatch { link: 3, sources: 1 })
        ));
    }

    #[tokio::test]
    async fn test_failing_source_keeps_previous_registry_entry() {
        // Arrange: one good screen, then errors.
        let good = Screen::new("x".repeat(84));
        let sources: Vec<Box<dyn MonitorSource>> = vec![Box::new(FixedSource {
            screens: vec![good.clone()],
            calls: 0,
        })];
        let mut scheduler = Scheduler::new(
            sources,
            link(Arc::new(MockHidBackend::empty()), 1),
            Duration::from_secs(1),
        )
        .unwrap();

        // Act
        scheduler.tick().await;
        scheduler.tick().await;

        // Assert
        assert_eq!(scheduler.registry().get(0), Some(&good));
    }
}
