//! `robovac-runtime` – the host loop around each vacuum.
//!
//! # Modules
//!
//! - [`poller`] – [`spawn_poller`][poller::spawn_poller]: one Tokio task per
//!   device that polls on a fixed interval, publishes changed snapshots on a
//!   `watch` channel and serialises commands with polls.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod poller;
pub mod telemetry;

pub use poller::{PollerConfig, PollerHandle, spawn_poller};
pub use telemetry::{TracerProviderGuard, init_tracing};
