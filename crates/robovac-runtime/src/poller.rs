//! [`spawn_poller`] – one background task per vacuum.
//!
//! The task owns its [`VacuumDevice`], so polls and commands for one device
//! never overlap.  Each cycle:
//!
//! 1. **Tick** – every `poll_interval` the device is polled and the
//!    interpreted [`DeviceSnapshot`] is published on a `watch` channel, but
//!    only when it differs from the one already published.
//! 2. **Command** – a command received over the `mpsc` channel is encoded
//!    against the last snapshot and written.  After `settle_delay` the device
//!    is polled again so subscribers see the effect, then the caller gets the
//!    applied write set.
//!
//! A failed poll leaves the published snapshot untouched.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use robovac_hal::{SimVacuum, VacuumDevice};
//! use robovac_runtime::poller::{PollerConfig, spawn_poller};
//! use robovac_types::{Command, LifecycleState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let device = VacuumDevice::new("Kitchen", "T2250", Box::new(SimVacuum::docked("vac-1")));
//! let poller = spawn_poller(device, PollerConfig {
//!     poll_interval: Duration::from_secs(20),
//!     settle_delay: Duration::from_millis(10),
//! });
//!
//! poller.send(Command::ReturnToBase).await.unwrap();
//! assert_eq!(poller.latest().map(|s| s.lifecycle), Some(LifecycleState::Returning));
//! poller.shutdown().await;
//! # }
//! ```

use std::time::Duration;

use robovac_hal::VacuumDevice;
use robovac_types::{CapabilityProfile, Command, DeviceSnapshot, RawWriteSet, RoboVacError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Vendor integration refresh rate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Pause between a write and the follow-up poll.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Shortest poll interval a poller accepts; anything below is raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

const REQUEST_QUEUE_DEPTH: usize = 16;

/// Timing for one poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl PollerConfig {
    /// The same timing with `poll_interval` raised to [`MIN_POLL_INTERVAL`].
    pub fn clamped(self) -> Self {
        Self {
            poll_interval: self.poll_interval.max(MIN_POLL_INTERVAL),
            ..self
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<RawWriteSet, RoboVacError>>,
    },
    Refresh {
        reply: oneshot::Sender<Result<DeviceSnapshot, RoboVacError>>,
    },
}

/// Caller side of a running poller.
///
/// Dropping the handle also stops the task, once its in-flight request
/// completes.
pub struct PollerHandle {
    id: String,
    name: String,
    profile: CapabilityProfile,
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<Option<DeviceSnapshot>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    /// The last published snapshot, `None` until the first successful poll.
    pub fn latest(&self) -> Option<DeviceSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Option<DeviceSnapshot>> {
        self.snapshots.clone()
    }

    /// Encode and write `command`, wait for the device to settle and
    /// re-poll.  Returns the write set that was sent.
    ///
    /// # Errors
    ///
    /// The encoder's `UnsupportedCommand`/`InvalidCommand`, the transport's
    /// `Transport`, or [`RoboVacError::PollerStopped`] when the task is gone.
    pub async fn send(&self, command: Command) -> Result<RawWriteSet, RoboVacError> {
        let (reply, response) = oneshot::channel();
        self.request(Request::Command { command, reply }, response).await
    }

    /// Poll now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<DeviceSnapshot, RoboVacError> {
        let (reply, response) = oneshot::channel();
        self.request(Request::Refresh { reply }, response).await
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        let Self { id, requests, task, .. } = self;
        drop(requests);
        if let Err(e) = task.await {
            warn!(device = %id, error = %e, "poller task ended abnormally");
        }
    }

    async fn request<T>(
        &self,
        request: Request,
        response: oneshot::Receiver<Result<T, RoboVacError>>,
    ) -> Result<T, RoboVacError> {
        let stopped = || RoboVacError::PollerStopped(self.id.clone());
        self.requests.send(request).await.map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────────────────

/// Start polling `device` on the current Tokio runtime.
///
/// A `poll_interval` below [`MIN_POLL_INTERVAL`] is raised to it.
pub fn spawn_poller(device: VacuumDevice, config: PollerConfig) -> PollerHandle {
    let config = config.clamped();
    let (requests, inbox) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    let (publisher, snapshots) = watch::channel(device.last_snapshot().cloned());

    let id = device.id().to_string();
    let name = device.name().to_string();
    let profile = device.profile().clone();
    let task = tokio::spawn(run(device, config, inbox, publisher));

    info!(device = %id, interval = ?config.poll_interval, "poller started");
    PollerHandle {
        id,
        name,
        profile,
        requests,
        snapshots,
        task,
    }
}

async fn run(
    mut device: VacuumDevice,
    config: PollerConfig,
    mut inbox: mpsc::Receiver<Request>,
    publisher: watch::Sender<Option<DeviceSnapshot>>,
) {
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Failures are already logged by the device.
                let _ = poll_and_publish(&mut device, &publisher).await;
            }
            request = inbox.recv() => match request {
                None => break,
                Some(Request::Refresh { reply }) => {
                    let _ = reply.send(poll_and_publish(&mut device, &publisher).await);
                }
                Some(Request::Command { command, reply }) => {
                    let result = device.execute(&command).await;
                    match &result {
                        Ok(writes) => {
                            info!(device = %device.id(), command = command.name(), writes = writes.len(), "command sent");
                            tokio::time::sleep(config.settle_delay).await;
                            let _ = poll_and_publish(&mut device, &publisher).await;
                            ticker.reset_at(Instant::now() + config.poll_interval);
                        }
                        Err(e) => warn!(device = %device.id(), command = command.name(), error = %e, "command failed"),
                    }
                    let _ = reply.send(result);
                }
            }
        }
    }

    debug!(device = %device.id(), "poller stopped");
}

async fn poll_and_publish(
    device: &mut VacuumDevice,
    publisher: &watch::Sender<Option<DeviceSnapshot>>,
) -> Result<DeviceSnapshot, RoboVacError> {
    let snapshot = device.poll().await?.clone();
    let changed = publisher.send_if_modified(|current| {
        if current.as_ref() == Some(&snapshot) {
            false
        } else {
            *current = Some(snapshot.clone());
            true
        }
    });
    if changed {
        debug!(device = %device.id(), lifecycle = %snapshot.lifecycle, "snapshot changed");
    }
    Ok(snapshot)
}
