//! [`PerfProbe`] over the local machine.
//!
//! - CPU and memory come from `sysinfo`.  CPU usage is a delta between two
//!   refreshes, so the very first reading is 0% and later ones cover the time
//!   since the previous tick.
//! - Battery charge comes from `starship-battery`.  A machine without a
//!   battery (a desktop) reports 100%, i.e. "on mains".
//! - Volume comes from the platform mixer command (see [`volume`]).

use async_trait::async_trait;
use sysinfo::System;
use tokio::sync::Mutex;

use crate::application::monitors::{PerfProbe, ProbeError};

pub mod volume;

use volume::VolumeReader;

/// Charge reported when no battery is present.
const MAINS_POWER_PERCENT: f64 = 100.0;

/// Reads CPU, memory, volume and battery from the host OS.
pub struct SystemPerfProbe {
    system: Mutex<System>,
    volume: VolumeReader,
}

impl SystemPerfProbe {
    pub fn new() -> Result<Self, regex::Error> {
        let mut system = System::new();
        // Prime the CPU counters so the second refresh has a baseline.
        system.refresh_cpu_usage();
        Ok(Self {
            system: Mutex::new(system),
            volume: VolumeReader::new()?,
        })
    }
}

#[async_trait]
impl PerfProbe for SystemPerfProbe {
    async fn cpu_percent(&self) -> Result<f64, ProbeError> {
        let mut system = self.system.lock().await;
        system.refresh_cpu_usage();
        Ok(f64::from(system.global_cpu_usage()))
    }

    async fn memory_percent(&self) -> Result<f64, ProbeError> {
        let mut system = self.system.lock().await;
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable {
                metric: "memory",
                reason: "total memory reported as zero".to_string(),
            });
        }
        Ok(system.used_memory() as f64 / total as f64 * 100.0)
    }

    async fn volume_percent(&self) -> Result<f64, ProbeError> {
        self.volume.read_percent().await
    }

    async fn battery_percent(&self) -> Result<f64, ProbeError> {
        tokio::task::spawn_blocking(read_battery_percent)
            .await
            .map_err(|e| battery_error(e.to_string()))?
    }
}

fn battery_error(reason: String) -> ProbeError {
    ProbeError::Unavailable {
        metric: "battery",
        reason,
    }
}

fn read_battery_percent() -> Result<f64, ProbeError> {
    let manager = starship_battery::Manager::new().map_err(|e| battery_error(e.to_string()))?;
    let mut batteries = manager
        .batteries()
        .map_err(|e| battery_error(e.to_string()))?;
    match batteries.next() {
        Some(Ok(battery)) => Ok(f64::from(battery.state_of_charge().value) * 100.0),
        Some(Err(e)) => Err(battery_error(e.to_string())),
        None => Ok(MAINS_POWER_PERCENT),
    }
}
