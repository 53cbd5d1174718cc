//! [`VacuumDevice`] – one configured vacuum.
//!
//! Binds a [`DeviceTransport`] to the profile resolved from the device's
//! model code and remembers the last successfully interpreted snapshot.
//! Encoding commands against that snapshot is what makes `Locate` a toggle
//! and `Start` mode-aware.
//!
//! Polls and commands take `&mut self`, so one device never has two
//! overlapping polls.

use std::sync::Arc;

use robovac_kernel::{Clock, CommandEncoder, SystemClock, exposed_attributes, interpret, resolve};
use robovac_types::{
    CapabilityProfile, Command, DeviceModelId, DeviceSnapshot, RawWriteSet, RoboVacError,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::transport::DeviceTransport;

pub struct VacuumDevice {
    id: String,
    name: String,
    model: DeviceModelId,
    profile: CapabilityProfile,
    transport: Box<dyn DeviceTransport>,
    clock: Arc<dyn Clock>,
    last: Option<DeviceSnapshot>,
}

impl VacuumDevice {
    /// Wrap `transport`, resolving the profile from `model`.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<DeviceModelId>,
        transport: Box<dyn DeviceTransport>,
    ) -> Self {
        let model = model.into();
        let profile = resolve(&model);
        Self {
            id: transport.id().to_string(),
            name: name.into(),
            model,
            profile,
            transport,
            clock: Arc::new(SystemClock),
            last: None,
        }
    }

    /// Replace the time source used for timestamped payloads.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &DeviceModelId {
        &self.model
    }

    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    /// The last successfully interpreted snapshot, if any poll succeeded.
    pub fn last_snapshot(&self) -> Option<&DeviceSnapshot> {
        self.last.as_ref()
    }

    /// Fetch and interpret the current state.
    ///
    /// On a transport failure the previous snapshot is kept and the error
    /// is returned.
    pub async fn poll(&mut self) -> Result<&DeviceSnapshot, RoboVacError> {
        let raw = self.transport.fetch().await.inspect_err(|e| {
            warn!(device = %self.id, error = %e, "poll failed, keeping previous snapshot");
        })?;
        let snapshot = interpret(&raw, &self.profile);
        debug!(device = %self.id, lifecycle = %snapshot.lifecycle, "polled");
        Ok(&*self.last.insert(snapshot))
    }

    /// Encode `command` against the last snapshot and write it.
    ///
    /// Returns the write set that was sent.  Nothing is written when the
    /// command is rejected.
    pub async fn execute(&mut self, command: &Command) -> Result<RawWriteSet, RoboVacError> {
        let writes = CommandEncoder::with_clock(&self.profile, self.clock.as_ref())
            .encode(command, self.last.as_ref())?;
        self.transport.write(&writes).await?;
        Ok(writes)
    }

    /// Presentation attributes for the last snapshot.
    pub fn attributes(&self) -> Option<Map<String, Value>> {
        self.last
            .as_ref()
            .map(|snapshot| exposed_attributes(snapshot, &self.profile))
    }
}

impl std::fmt::Debug for VacuumDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VacuumDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("family", &self.profile.family)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimVacuum;
    use robovac_kernel::FixedClock;
    use robovac_types::{LifecycleState, RawValue};
    use serde_json::json;

    fn device(model: &str) -> (VacuumDevice, SimVacuum) {
        let sim = SimVacuum::docked("vac-1");
        let device = VacuumDevice::new("Hallway", model, Box::new(sim.clone()));
        (device, sim)
    }

    #[tokio::test]
    async fn poll_interprets_reported_state() {
        let (mut device, _) = device("T2118");
        let snapshot = device.poll().await.unwrap();
        assert_eq!(snapshot.lifecycle, LifecycleState::Docked);
        assert_eq!(snapshot.battery_level, Some(100));
        assert_eq!(device.id(), "vac-1");
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_snapshot() {
        let (mut device, sim) = device("T2118");
        device.poll().await.unwrap();
        sim.set_offline(true);
        assert!(device.poll().await.is_err());
        assert_eq!(
            device.last_snapshot().map(|s| s.lifecycle),
            Some(LifecycleState::Docked)
        );
    }

    #[tokio::test]
    async fn locate_toggles_against_last_snapshot() {
        let (mut device, sim) = device("T2118");
        device.poll().await.unwrap();
        device.execute(&Command::Locate).await.unwrap();
        device.poll().await.unwrap();
        device.execute(&Command::Locate).await.unwrap();

        let history = sim.history();
        assert_eq!(history[0].get("103"), Some(&RawValue::Bool(true)));
        assert_eq!(history[1].get("103"), Some(&RawValue::Bool(false)));
    }

    #[tokio::test]
    async fn rejected_command_writes_nothing() {
        let (mut device, sim) = device("T2118");
        let err = device
            .execute(&Command::send("roomClean", Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, RoboVacError::UnsupportedCommand { .. }));
        assert!(sim.history().is_empty());
    }

    #[tokio::test]
    async fn room_clean_uses_injected_clock() {
        let sim = SimVacuum::docked("vac-x");
        let mut device = VacuumDevice::new("Upstairs", "T2262", Box::new(sim.clone()))
            .with_clock(Arc::new(FixedClock(1_700_000_000_000)));
        device
            .execute(&Command::send("roomClean", json!({"roomIds": [3, 5], "count": 2})))
            .await
            .unwrap();

        let written = sim.history()[0].get("124").and_then(|v| v.as_str()).map(str::to_owned);
        let request = robovac_kernel::codec::decode_room_clean_request(&written.unwrap()).unwrap();
        assert_eq!(request.timestamp, 1_700_000_000_000);
        assert_eq!(request.data.room_ids, vec![3, 5]);
    }

    #[tokio::test]
    async fn attributes_follow_profile() {
        let (mut device, _) = device("Q1");
        assert!(device.attributes().is_none());
        device.poll().await.unwrap();
        let attrs = device.attributes().unwrap();
        assert!(!attrs.contains_key("battery_level"));
        assert_eq!(attrs["mode"], "auto");
    }
}
