//! `robovac-hal` – the device transport boundary.
//!
//! The encrypted local transport is an external collaborator; this crate
//! only defines what the core needs from it and wires it to the kernel.
//!
//! # Modules
//!
//! - [`transport`] – [`DeviceTransport`][transport::DeviceTransport]: fetch a
//!   raw snapshot, apply a raw write set.
//! - [`sim`] – [`SimVacuum`][sim::SimVacuum]: an in-process transport for
//!   tests and dry runs.
//! - [`device`] – [`VacuumDevice`][device::VacuumDevice]: one transport plus
//!   its resolved profile and last known snapshot.
//! - [`registry`] – [`VacuumRegistry`][registry::VacuumRegistry]: devices
//!   keyed by id, drained into one task per device.

pub mod device;
pub mod registry;
pub mod sim;
pub mod transport;

pub use device::VacuumDevice;
pub use registry::VacuumRegistry;
pub use sim::SimVacuum;
pub use transport::DeviceTransport;
