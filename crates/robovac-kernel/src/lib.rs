//! `robovac-kernel` – capability resolution, state interpretation and
//! command encoding.
//!
//! Everything in this crate is pure, synchronous computation over static
//! tables.  Nothing here performs I/O; the transport lives in `robovac-hal`.
//!
//! # Modules
//!
//! - [`dps`] – the static data-point code table and the fan-speed alias
//!   table shared by both directions.
//! - [`capability_resolver`] – [`CapabilityResolver`][capability_resolver::CapabilityResolver]:
//!   maps a [`DeviceModelId`][robovac_types::DeviceModelId] prefix to a
//!   [`CapabilityProfile`][robovac_types::CapabilityProfile] through a
//!   declarative family table.
//! - [`error_mapper`] – vendor error code to human-readable text.
//! - [`codec`] – the opaque blob formats: consumables record,
//!   do-not-disturb schedule and the room-clean request.
//! - [`interpreter`] – [`interpret`][interpreter::interpret]: raw snapshot to
//!   [`DeviceSnapshot`][robovac_types::DeviceSnapshot].
//! - [`command_gate`] – [`CommandGate`][command_gate::CommandGate]: rejects
//!   commands whose feature is missing from the device's profile.
//! - [`encoder`] – [`CommandEncoder`][encoder::CommandEncoder]: semantic
//!   command to an ordered [`RawWriteSet`][robovac_types::RawWriteSet].
//! - [`attributes`] – profile-gated attribute map for presentation layers.

pub mod attributes;
pub mod capability_resolver;
pub mod codec;
pub mod command_gate;
pub mod dps;
pub mod encoder;
pub mod error_mapper;
pub mod interpreter;

pub use capability_resolver::{CapabilityResolver, FamilyTable, resolve};
pub use codec::{Clock, CodecError, FixedClock, SystemClock};
pub use command_gate::CommandGate;
pub use dps::{DpsCode, ValueKind};
pub use encoder::{CommandEncoder, encode};
pub use error_mapper::describe;
pub use interpreter::interpret;
pub use attributes::exposed_attributes;
