//! [`VacuumRegistry`] – configured vacuums keyed by device id.
//!
//! Hosts build the registry from configuration, so a device id entered twice
//! resolves to the last entry, then drain it with
//! [`VacuumRegistry::into_devices`] to hand each device to its own task.

use std::collections::BTreeMap;

use crate::device::VacuumDevice;

#[derive(Debug, Default)]
pub struct VacuumRegistry {
    devices: BTreeMap<String, VacuumDevice>,
}

impl VacuumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device.  Any previously registered device with the same
    /// id is replaced.
    pub fn register(&mut self, device: VacuumDevice) {
        self.devices.insert(device.id().to_string(), device);
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Hand every device over to the caller, in id order.
    pub fn into_devices(self) -> impl Iterator<Item = VacuumDevice> {
        self.devices.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimVacuum;

    fn device(name: &str, id: &str) -> VacuumDevice {
        VacuumDevice::new(name, "T2250", Box::new(SimVacuum::docked(id)))
    }

    #[test]
    fn register_replaces_same_id() {
        let mut registry = VacuumRegistry::new();
        assert!(registry.is_empty());
        registry.register(device("Kitchen", "vac-1"));
        registry.register(device("Hallway", "vac-1"));
        assert_eq!(registry.len(), 1);

        let names: Vec<_> = registry.into_devices().map(|d| d.name().to_string()).collect();
        assert_eq!(names, ["Hallway"]);
    }

    #[test]
    fn devices_drain_in_id_order() {
        let mut registry = VacuumRegistry::new();
        registry.register(device("Kitchen", "vac-kitchen"));
        registry.register(device("Bedroom", "vac-bedroom"));

        let ids: Vec<_> = registry.into_devices().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, ["vac-bedroom", "vac-kitchen"]);
    }
}
