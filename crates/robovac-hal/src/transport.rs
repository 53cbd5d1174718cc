//! Generic `DeviceTransport` trait for the vendor's local protocol.
//!
//! The session handshake and wire encryption live behind this trait.  The
//! rest of the stack only ever talks to the trait, so a real transport and
//! [`SimVacuum`][crate::sim::SimVacuum] are interchangeable.

use async_trait::async_trait;
use robovac_types::{RawSnapshot, RawWriteSet, RoboVacError};

/// A connection to one device.
///
/// # Contract
///
/// * `fetch` – return the device's current data points.  Timeouts and
///   unreachable devices surface as [`RoboVacError::Transport`]; the host
///   then keeps the previous snapshot.
///
/// * `write` – apply every write of the set, in order, as one device write.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Stable device identifier, e.g. the vendor device id.
    fn id(&self) -> &str;

    async fn fetch(&self) -> Result<RawSnapshot, RoboVacError>;

    async fn write(&self, writes: &RawWriteSet) -> Result<(), RoboVacError>;
}
