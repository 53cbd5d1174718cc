//! [`CommandEncoder`] – semantic command to raw data-point writes.
//!
//! The encoder never talks to a transport.  It returns a [`RawWriteSet`]
//! for the host to send in one device write; the host then waits for the
//! device to settle and polls again.
//!
//! Toggle commands (locate, auto-return, do-not-disturb, boost-IQ) write
//! the negation of the flag in the current snapshot; an absent flag counts
//! as off.

use robovac_types::{
    CapabilityProfile, Command, DeviceSnapshot, LifecycleState, NamedCommand, RawWriteSet,
    RoboVacError,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::codec::{Clock, SystemClock, encode_do_not_disturb_window, encode_room_clean_request};
use crate::command_gate::CommandGate;
use crate::dps::{DpsCode, fan_speed_token};

const MODE_AUTO: &str = "auto";
const MODE_SPOT: &str = "Spot";
const MODE_EDGE: &str = "Edge";
const MODE_SMALL_ROOM: &str = "SmallRoom";
const MODE_NO_SWEEP: &str = "Nosweep";
const MODE_ROOM: &str = "room";

fn default_room_ids() -> Vec<u32> {
    vec![1]
}

fn default_clean_times() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct RoomCleanParams {
    #[serde(rename = "roomIds", default = "default_room_ids")]
    room_ids: Vec<u32>,
    #[serde(default = "default_clean_times")]
    count: u32,
}

impl Default for RoomCleanParams {
    fn default() -> Self {
        Self {
            room_ids: default_room_ids(),
            count: default_clean_times(),
        }
    }
}

/// Encodes commands for one device profile.
///
/// # Example
///
/// ```
/// use robovac_kernel::{CommandEncoder, resolve};
/// use robovac_types::{Command, RawValue};
///
/// let profile = resolve(&"T2250".into());
/// let writes = CommandEncoder::new(&profile)
///     .encode(&Command::SetFanSpeed("Boost IQ".into()), None)
///     .unwrap();
///
/// assert_eq!(writes.get("102"), Some(&RawValue::from("Boost_IQ")));
/// ```
pub struct CommandEncoder<'a> {
    profile: &'a CapabilityProfile,
    clock: &'a dyn Clock,
}

impl<'a> CommandEncoder<'a> {
    /// Encoder stamping payloads with wall-clock time.
    pub fn new(profile: &'a CapabilityProfile) -> Self {
        Self::with_clock(profile, &SystemClock)
    }

    pub fn with_clock(profile: &'a CapabilityProfile, clock: &'a dyn Clock) -> Self {
        Self { profile, clock }
    }

    /// Encode `command` against the last known state of the device.
    ///
    /// `current` is `None` before the first successful poll.
    ///
    /// # Errors
    ///
    /// - [`RoboVacError::UnsupportedCommand`] – the profile lacks a feature the
    ///   command needs, or the named command is unknown.
    /// - [`RoboVacError::InvalidCommand`] – a fan-speed label outside the
    ///   vocabulary, or unusable `roomClean` parameters.
    pub fn encode(
        &self,
        command: &Command,
        current: Option<&DeviceSnapshot>,
    ) -> Result<RawWriteSet, RoboVacError> {
        CommandGate::new(self.profile).check(command)?;

        let writes = match command {
            Command::Locate => {
                let locating = current.and_then(|s| s.locating).unwrap_or(false);
                RawWriteSet::single(DpsCode::Locate.as_str(), !locating)
            }
            Command::ReturnToBase | Command::Stop => {
                RawWriteSet::single(DpsCode::ReturnHome.as_str(), true)
            }
            Command::Start => RawWriteSet::single(DpsCode::Mode.as_str(), start_mode(current)),
            Command::Pause => RawWriteSet::single(DpsCode::PlayPause.as_str(), false),
            Command::CleanSpot => RawWriteSet::single(DpsCode::Mode.as_str(), MODE_SPOT),
            Command::SetFanSpeed(label) => {
                let label = self.profile.fan_speed(label).ok_or_else(|| {
                    RoboVacError::InvalidCommand {
                        command: command.name().to_string(),
                        reason: format!(
                            "'{label}' is not one of {:?}",
                            self.profile.fan_speeds
                        ),
                    }
                })?;
                RawWriteSet::single(DpsCode::FanSpeed.as_str(), fan_speed_token(label))
            }
            Command::SendNamed { name, params } => {
                self.encode_named(name.parse()?, params, current)?
            }
        };

        info!(command = command.name(), ?writes, "encoded command");
        Ok(writes)
    }

    fn encode_named(
        &self,
        named: NamedCommand,
        params: &Value,
        current: Option<&DeviceSnapshot>,
    ) -> Result<RawWriteSet, RoboVacError> {
        let flag = |read: fn(&DeviceSnapshot) -> Option<bool>| {
            current.and_then(read).unwrap_or(false)
        };

        Ok(match named {
            NamedCommand::EdgeClean => RawWriteSet::single(DpsCode::Mode.as_str(), MODE_EDGE),
            NamedCommand::SmallRoomClean => {
                RawWriteSet::single(DpsCode::Mode.as_str(), MODE_SMALL_ROOM)
            }
            NamedCommand::AutoClean => RawWriteSet::single(DpsCode::Mode.as_str(), MODE_AUTO),
            NamedCommand::AutoReturn => {
                RawWriteSet::single(DpsCode::AutoReturn.as_str(), !flag(|s| s.auto_return))
            }
            NamedCommand::BoostIq => {
                RawWriteSet::single(DpsCode::BoostIq.as_str(), !flag(|s| s.boost_iq))
            }
            NamedCommand::DoNotDisturb => {
                let enable = !flag(|s| s.do_not_disturb);
                // Schedule first, then the flag, in the same write.
                let mut writes = RawWriteSet::new();
                writes.push(
                    DpsCode::DoNotDisturbSchedule.as_str(),
                    encode_do_not_disturb_window(enable),
                );
                writes.push(DpsCode::DoNotDisturb.as_str(), enable);
                writes
            }
            NamedCommand::RoomClean => {
                let params: RoomCleanParams = if params.is_null() {
                    RoomCleanParams::default()
                } else {
                    serde_json::from_value(params.clone()).map_err(|e| {
                        RoboVacError::InvalidCommand {
                            command: named.to_string(),
                            reason: e.to_string(),
                        }
                    })?
                };
                let blob = encode_room_clean_request(&params.room_ids, params.count, self.clock)
                    .map_err(|e| RoboVacError::InvalidCommand {
                        command: named.to_string(),
                        reason: e.to_string(),
                    })?;
                RawWriteSet::single(DpsCode::RoomClean.as_str(), blob)
            }
        })
    }
}

/// Mode to write for `Start`.
///
/// The current mode is resumed, except that a no-sweep mode, or a stale
/// room selection on a docked device, restarts in `auto`.
fn start_mode(current: Option<&DeviceSnapshot>) -> String {
    let Some(snapshot) = current else {
        return MODE_AUTO.to_string();
    };
    let docked = snapshot.lifecycle == LifecycleState::Docked
        || matches!(snapshot.status.as_deref(), Some("Charging" | "completed"));
    match snapshot.mode.as_deref() {
        None | Some(MODE_NO_SWEEP) => MODE_AUTO.to_string(),
        Some(MODE_ROOM) if docked => MODE_AUTO.to_string(),
        Some(mode) => mode.to_string(),
    }
}

/// Encode `command` for `profile` against `current`, using wall-clock time.
pub fn encode(
    command: &Command,
    current: Option<&DeviceSnapshot>,
    profile: &CapabilityProfile,
) -> Result<RawWriteSet, RoboVacError> {
    CommandEncoder::new(profile).encode(command, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability_resolver::resolve;
    use crate::codec::{FixedClock, decode_room_clean_request};
    use crate::interpreter::interpret;
    use robovac_types::{RawSnapshot, RawValue};
    use serde_json::json;

    fn snapshot(lifecycle: LifecycleState, mode: Option<&str>) -> DeviceSnapshot {
        DeviceSnapshot {
            lifecycle,
            status: None,
            battery_level: None,
            error_code: None,
            error: None,
            fan_speed: None,
            mode: mode.map(str::to_string),
            cleaning_area: None,
            cleaning_time: None,
            auto_return: None,
            do_not_disturb: None,
            boost_iq: None,
            consumables: None,
            locating: None,
        }
    }

    fn x_series() -> CapabilityProfile {
        resolve(&"T2262".into())
    }

    #[test]
    fn start_overrides_no_sweep() {
        let current = snapshot(LifecycleState::Idle, Some("Nosweep"));
        let writes = encode(&Command::Start, Some(&current), &x_series()).unwrap();
        assert_eq!(writes, RawWriteSet::single("5", "auto"));
    }

    #[test]
    fn start_overrides_stale_room_when_docked() {
        let current = snapshot(LifecycleState::Docked, Some("room"));
        let writes = encode(&Command::Start, Some(&current), &x_series()).unwrap();
        assert_eq!(writes.get("5"), Some(&RawValue::from("auto")));
    }

    #[test]
    fn start_resumes_room_while_cleaning() {
        let current = snapshot(LifecycleState::Cleaning, Some("room"));
        let writes = encode(&Command::Start, Some(&current), &x_series()).unwrap();
        assert_eq!(writes.get("5"), Some(&RawValue::from("room")));
    }

    #[test]
    fn start_passes_other_modes_through() {
        let current = snapshot(LifecycleState::Docked, Some("Edge"));
        let writes = encode(&Command::Start, Some(&current), &x_series()).unwrap();
        assert_eq!(writes.get("5"), Some(&RawValue::from("Edge")));

        let writes = encode(&Command::Start, None, &x_series()).unwrap();
        assert_eq!(writes.get("5"), Some(&RawValue::from("auto")));
    }

    #[test]
    fn simple_commands_write_their_codes() {
        let profile = x_series();
        let cases = [
            (Command::ReturnToBase, "101", RawValue::Bool(true)),
            (Command::Stop, "101", RawValue::Bool(true)),
            (Command::Pause, "2", RawValue::Bool(false)),
            (Command::CleanSpot, "5", RawValue::from("Spot")),
            (Command::Locate, "103", RawValue::Bool(true)),
            (Command::send("autoClean", Value::Null), "5", RawValue::from("auto")),
        ];
        for (cmd, code, value) in cases {
            let writes = encode(&cmd, None, &profile).unwrap();
            assert_eq!(writes.len(), 1, "{cmd:?}");
            assert_eq!(writes.get(code), Some(&value), "{cmd:?}");
        }
    }

    #[test]
    fn locate_toggles_off_when_beeping() {
        let mut current = snapshot(LifecycleState::Idle, None);
        current.locating = Some(true);
        let writes = encode(&Command::Locate, Some(&current), &x_series()).unwrap();
        assert_eq!(writes.get("103"), Some(&RawValue::Bool(false)));
    }

    #[test]
    fn fan_speed_roundtrips_through_aliases() {
        for model in ["T2118", "T2250", "T2262"] {
            let profile = resolve(&model.into());
            for label in &profile.fan_speeds {
                let writes =
                    encode(&Command::SetFanSpeed(label.clone()), None, &profile).unwrap();
                let mut raw = RawSnapshot::new();
                raw.apply(&writes);
                let read_back = interpret(&raw, &profile);
                assert_eq!(read_back.fan_speed.as_ref(), Some(label), "{model} {label}");
            }
        }
    }

    #[test]
    fn fan_speed_writes_vendor_tokens() {
        let c_series = resolve(&"T2118".into());
        let writes = encode(&Command::SetFanSpeed("No Suction".into()), None, &c_series).unwrap();
        assert_eq!(writes.get("102"), Some(&RawValue::from("No_suction")));

        let writes = encode(&Command::SetFanSpeed("Pure".into()), None, &x_series()).unwrap();
        assert_eq!(writes.get("102"), Some(&RawValue::from("Quiet")));
    }

    #[test]
    fn fan_speed_outside_vocabulary_is_invalid() {
        let err = encode(&Command::SetFanSpeed("Turbo".into()), None, &resolve(&"T2118".into()))
            .unwrap_err();
        assert!(matches!(err, RoboVacError::InvalidCommand { .. }));
    }

    #[test]
    fn do_not_disturb_writes_schedule_then_flag() {
        let profile = resolve(&"T2251".into());
        let cmd = Command::send("doNotDisturb", Value::Null);

        let mut off = snapshot(LifecycleState::Docked, None);
        off.do_not_disturb = Some(false);
        let enable = encode(&cmd, Some(&off), &profile).unwrap();

        let mut on = off.clone();
        on.do_not_disturb = Some(true);
        let disable = encode(&cmd, Some(&on), &profile).unwrap();

        for writes in [&enable, &disable] {
            let codes: Vec<&str> = writes.iter().map(|w| w.code.as_str()).collect();
            assert_eq!(codes, vec!["139", "107"]);
        }
        assert_eq!(enable.get("139"), Some(&RawValue::from("MTAwMDAwMDAw")));
        assert_eq!(enable.get("107"), Some(&RawValue::Bool(true)));
        assert_eq!(disable.get("139"), Some(&RawValue::from("MEQ4MDAwMDAw")));
        assert_eq!(disable.get("107"), Some(&RawValue::Bool(false)));
    }

    #[test]
    fn toggles_negate_current_flags() {
        let profile = x_series();
        let mut current = snapshot(LifecycleState::Idle, None);
        current.auto_return = Some(true);
        current.boost_iq = Some(false);

        let writes = encode(&Command::send("autoReturn", Value::Null), Some(&current), &profile)
            .unwrap();
        assert_eq!(writes.get("135"), Some(&RawValue::Bool(false)));

        let writes =
            encode(&Command::send("boostIQ", Value::Null), Some(&current), &profile).unwrap();
        assert_eq!(writes.get("118"), Some(&RawValue::Bool(true)));
    }

    #[test]
    fn room_clean_uses_params_and_clock() {
        let profile = x_series();
        let clock = FixedClock(42);
        let encoder = CommandEncoder::with_clock(&profile, &clock);
        let writes = encoder
            .encode(
                &Command::send("roomClean", json!({"roomIds": [2, 4], "count": 3})),
                None,
            )
            .unwrap();
        let Some(RawValue::Text(blob)) = writes.get("124") else {
            panic!("room clean blob missing");
        };
        let request = decode_room_clean_request(blob).unwrap();
        assert_eq!(request.data.room_ids, vec![2, 4]);
        assert_eq!(request.data.clean_times, 3);
        assert_eq!(request.timestamp, 42);
    }

    #[test]
    fn room_clean_defaults_to_single_room_once() {
        let profile = x_series();
        for params in [Value::Null, json!({})] {
            let writes = encode(&Command::send("roomClean", params), None, &profile).unwrap();
            let Some(RawValue::Text(blob)) = writes.get("124") else {
                panic!("room clean blob missing");
            };
            let request = decode_room_clean_request(blob).unwrap();
            assert_eq!(request.data.room_ids, vec![1]);
            assert_eq!(request.data.clean_times, 1);
        }
    }

    #[test]
    fn room_clean_rejects_malformed_params() {
        let err = encode(
            &Command::send("roomClean", json!({"roomIds": "kitchen"})),
            None,
            &x_series(),
        )
        .unwrap_err();
        assert!(matches!(err, RoboVacError::InvalidCommand { .. }));
    }

    #[test]
    fn unsupported_commands_produce_no_writes() {
        let g_series = resolve(&"T2251".into());
        let err = encode(&Command::send("roomClean", Value::Null), None, &g_series).unwrap_err();
        assert!(matches!(err, RoboVacError::UnsupportedCommand { .. }));
    }
}
