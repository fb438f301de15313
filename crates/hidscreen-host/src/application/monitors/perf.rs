//! Performance screen: CPU, memory, volume and battery as percentage bars.

use async_trait::async_trait;
use hidscreen_core::{format_performance_screen, PerfStat, Screen, ScreenKind};
use thiserror::Error;
use tracing::warn;

use super::{MonitorError, MonitorSource};

/// Bar labels, top line first.
pub const PERF_LABELS: [&str; 4] = ["CPU:", "RAM:", "VOL:", "BAT:"];

/// Error type for a single system reading.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{metric} unavailable: {reason}")]
    Unavailable { metric: &'static str, reason: String },
}

/// Reads the four system metrics, each as a percentage in `0.0..=100.0`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PerfProbe: Send + Sync {
    async fn cpu_percent(&self) -> Result<f64, ProbeError>;
    async fn memory_percent(&self) -> Result<f64, ProbeError>;
    async fn volume_percent(&self) -> Result<f64, ProbeError>;
    async fn battery_percent(&self) -> Result<f64, ProbeError>;
}

/// Renders the performance screen from a [`PerfProbe`].
///
/// The four readings are taken concurrently.  A reading that fails keeps
/// the value from the previous tick (zero before the first success).
pub struct PerfMonitor<P> {
    probe: P,
    last: [f64; 4],
}

impl<P: PerfProbe> PerfMonitor<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            last: [0.0; 4],
        }
    }
}

#[async_trait]
impl<P: PerfProbe> MonitorSource for PerfMonitor<P> {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Performance
    }

    async fn produce_next_screen(&mut self) -> Result<Screen, MonitorError> {
        let (cpu, ram, vol, bat) = tokio::join!(
            self.probe.cpu_percent(),
            self.probe.memory_percent(),
            self.probe.volume_percent(),
            self.probe.battery_percent(),
        );

        for (slot, reading) in self.last.iter_mut().zip([cpu, ram, vol, bat]) {
            match reading {
                Ok(value) => *slot = value,
                Err(e) => warn!("{e}; keeping previous reading"),
            }
        }

        let stats: Vec<PerfStat> = PERF_LABELS
            .iter()
            .zip(self.last)
            .map(|(label, percent)| PerfStat::new(*label, percent))
            .collect();
        Ok(format_performance_screen(&stats)?)
    }
}
