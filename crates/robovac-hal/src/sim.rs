//! In-process simulated vacuum for tests and dry runs without hardware.
//!
//! [`SimVacuum`] keeps a data-point table in memory, applies every write
//! verbatim and mimics the few state transitions a real unit reports after
//! a command.  Clones share the same device, so a test can hand one clone
//! to a [`VacuumDevice`][crate::device::VacuumDevice] and keep another to
//! inspect writes.
//!
//! # Example
//!
//! ```rust
//! use robovac_hal::sim::SimVacuum;
//! use robovac_hal::transport::DeviceTransport;
//! use robovac_types::RawWriteSet;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sim = SimVacuum::docked("vac-1");
//! sim.write(&RawWriteSet::single("101", true)).await.unwrap();
//!
//! let dps = sim.fetch().await.unwrap();
//! assert_eq!(dps.get("15").and_then(|v| v.as_str()), Some("Recharge"));
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use robovac_kernel::DpsCode;
use robovac_types::{RawSnapshot, RawValue, RawWriteSet, RoboVacError};
use tracing::debug;

use crate::transport::DeviceTransport;

#[derive(Debug, Default)]
struct SimState {
    dps: RawSnapshot,
    offline: bool,
    history: Vec<RawWriteSet>,
}

/// A simulated device that records every write.
#[derive(Debug, Clone)]
pub struct SimVacuum {
    id: String,
    state: Arc<Mutex<SimState>>,
}

impl SimVacuum {
    /// A device reporting `dps`.
    pub fn new(id: impl Into<String>, dps: RawSnapshot) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(SimState {
                dps,
                ..SimState::default()
            })),
        }
    }

    /// A healthy, fully charged unit sitting on its base.
    pub fn docked(id: impl Into<String>) -> Self {
        let dps = [
            (DpsCode::State, RawValue::from("Charging")),
            (DpsCode::ErrorCode, RawValue::Int(0)),
            (DpsCode::BatteryLevel, RawValue::Int(100)),
            (DpsCode::Mode, RawValue::from("auto")),
            (DpsCode::FanSpeed, RawValue::from("Standard")),
            (DpsCode::Locate, RawValue::Bool(false)),
        ]
        .into_iter()
        .map(|(code, value)| (code.as_str(), value))
        .collect();
        Self::new(id, dps)
    }

    /// Overwrite one data point, as if the firmware had reported it.
    pub fn report(&self, code: &str, value: impl Into<RawValue>) {
        self.lock().dps.insert(code, value);
    }

    /// Make subsequent `fetch`/`write` calls fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every write set applied so far, oldest first.
    pub fn history(&self) -> Vec<RawWriteSet> {
        self.lock().history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unreachable(&self) -> RoboVacError {
        RoboVacError::Transport {
            device: self.id.clone(),
            details: "simulated device is offline".to_string(),
        }
    }
}

/// Reported state after a write, mirroring what firmware does on its own.
fn react(dps: &mut RawSnapshot, writes: &RawWriteSet) {
    let state = DpsCode::State.as_str();
    for write in writes {
        match (DpsCode::from_code(&write.code), &write.value) {
            (Some(DpsCode::ReturnHome), RawValue::Bool(true)) => dps.insert(state, "Recharge"),
            (Some(DpsCode::PlayPause), RawValue::Bool(false)) => dps.insert(state, "standby"),
            (Some(DpsCode::Mode), RawValue::Text(_)) => dps.insert(state, "Running"),
            (Some(DpsCode::RoomClean), RawValue::Text(_)) => {
                dps.insert(DpsCode::Mode.as_str(), "room");
                dps.insert(state, "Running");
            }
            _ => {}
        }
    }
}

#[async_trait]
impl DeviceTransport for SimVacuum {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> Result<RawSnapshot, RoboVacError> {
        let state = self.lock();
        if state.offline {
            return Err(self.unreachable());
        }
        Ok(state.dps.clone())
    }

    async fn write(&self, writes: &RawWriteSet) -> Result<(), RoboVacError> {
        let mut state = self.lock();
        if state.offline {
            return Err(self.unreachable());
        }
        debug!(device = %self.id, ?writes, "sim write");
        state.dps.apply(writes);
        react(&mut state.dps, writes);
        state.history.push(writes.clone());
        Ok(())
    }
}
