//! Raw data-point snapshot to semantic [`DeviceSnapshot`].
//!
//! Interpretation is total and deterministic: missing or malformed data
//! points never raise, the matching semantic field is simply `None`.  The
//! interpreter extracts everything present regardless of the profile; hiding
//! attributes a device does not support is the presentation layer's job
//! (see [`attributes`][crate::attributes]).

use robovac_types::{
    CapabilityProfile, ConsumableWear, DeviceSnapshot, ErrorCode, LifecycleState, RawSnapshot,
    RawValue,
};
use tracing::{debug, warn};

use crate::codec::decode_consumables;
use crate::dps::{DpsCode, DpsRead, fan_speed_label};
use crate::error_mapper::describe;

/// Consumables codes in priority order: the current record first, the
/// legacy G-series record as fallback.
const CONSUMABLES_PRIORITY: [DpsCode; 2] = [DpsCode::Consumables, DpsCode::LegacyConsumables];

/// Derive the lifecycle state from the raw state token and whether the error
/// data point reports a fault.
///
/// Strict priority chain, first match wins:
///
/// 1. state absent, or a non-sentinel error code present → `Error`
/// 2. `Charging` / `completed` → `Docked`
/// 3. `Recharge` → `Returning`
/// 4. `Sleeping` / `standby` → `Idle`
/// 5. anything else → `Cleaning`
pub fn lifecycle_state(status: Option<&str>, fault: bool) -> LifecycleState {
    let Some(status) = status else {
        return LifecycleState::Error;
    };
    if fault {
        return LifecycleState::Error;
    }
    match status {
        "Charging" | "completed" => LifecycleState::Docked,
        "Recharge" => LifecycleState::Returning,
        "Sleeping" | "standby" => LifecycleState::Idle,
        _ => LifecycleState::Cleaning,
    }
}

/// Interpret `snapshot` into a [`DeviceSnapshot`].
///
/// # Example
///
/// ```
/// use robovac_kernel::{interpret, resolve};
/// use robovac_types::{LifecycleState, RawSnapshot, RawValue};
///
/// let raw: RawSnapshot = [
///     ("15", RawValue::from("Recharge")),
///     ("106", RawValue::Int(0)),
///     ("104", RawValue::Int(42)),
/// ]
/// .into_iter()
/// .collect();
///
/// let snapshot = interpret(&raw, &resolve(&"T2251".into()));
/// assert_eq!(snapshot.lifecycle, LifecycleState::Returning);
/// assert_eq!(snapshot.battery_level, Some(42));
/// ```
pub fn interpret(snapshot: &RawSnapshot, profile: &CapabilityProfile) -> DeviceSnapshot {
    let status = snapshot.dps_str(DpsCode::State).map(str::to_string);
    let raw_error = snapshot.get(DpsCode::ErrorCode.as_str());
    let error_code = raw_error.and_then(ErrorCode::from_raw);
    let fault = raw_error.is_some_and(RawValue::reports_fault);
    let lifecycle = lifecycle_state(status.as_deref(), fault);

    let fan_speed = snapshot.dps_str(DpsCode::FanSpeed).map(|token| {
        let label = fan_speed_label(token);
        if profile.fan_speed(label).is_none() {
            debug!(token, label, "fan speed outside the profile vocabulary");
        }
        label.to_string()
    });

    DeviceSnapshot {
        lifecycle,
        status,
        battery_level: battery_level(snapshot),
        error: error_code.as_ref().map(describe),
        error_code,
        fan_speed,
        mode: snapshot.dps_str(DpsCode::Mode).map(str::to_string),
        cleaning_area: snapshot.dps_int(DpsCode::CleaningArea),
        cleaning_time: snapshot.dps_int(DpsCode::CleaningTime),
        auto_return: snapshot.dps_bool(DpsCode::AutoReturn),
        do_not_disturb: snapshot.dps_bool(DpsCode::DoNotDisturb),
        boost_iq: snapshot.dps_bool(DpsCode::BoostIq),
        consumables: consumables(snapshot),
        locating: snapshot.dps_bool(DpsCode::Locate),
    }
}

fn battery_level(snapshot: &RawSnapshot) -> Option<u8> {
    let raw = snapshot.dps_int(DpsCode::BatteryLevel)?;
    match u8::try_from(raw) {
        Ok(level) if level <= 100 => Some(level),
        _ => {
            debug!(raw, "battery level out of range");
            None
        }
    }
}

fn consumables(snapshot: &RawSnapshot) -> Option<ConsumableWear> {
    for code in CONSUMABLES_PRIORITY {
        let Some(blob) = snapshot.dps_str(code) else {
            continue;
        };
        match decode_consumables(blob) {
            Ok(wear) => return Some(wear),
            Err(e) => warn!(error = %e.at(code.as_str()), "consumables record ignored"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability_resolver::resolve;

    fn raw(points: &[(&str, RawValue)]) -> RawSnapshot {
        points.iter().cloned().collect()
    }

    fn g30() -> CapabilityProfile {
        resolve(&"T2250".into())
    }

    #[test]
    fn missing_state_is_error() {
        let snapshot = interpret(&raw(&[("104", RawValue::Int(50))]), &g30());
        assert_eq!(snapshot.lifecycle, LifecycleState::Error);
        assert_eq!(snapshot.status, None);
    }

    #[test]
    fn recharge_without_error_is_returning() {
        let snapshot = interpret(
            &raw(&[("15", "Recharge".into()), ("106", RawValue::Int(0))]),
            &g30(),
        );
        assert_eq!(snapshot.lifecycle, LifecycleState::Returning);
    }

    #[test]
    fn error_overrides_any_state() {
        let snapshot = interpret(&raw(&[("15", "foo".into()), ("106", RawValue::Int(5))]), &g30());
        assert_eq!(snapshot.lifecycle, LifecycleState::Error);
        assert_eq!(snapshot.error.as_deref(), Some("Error: Device trapped"));

        let snapshot = interpret(
            &raw(&[("15", "Charging".into()), ("106", "S2".into())]),
            &g30(),
        );
        assert_eq!(snapshot.lifecycle, LifecycleState::Error);
    }

    #[test]
    fn error_value_of_unexpected_shape_still_forces_error() {
        for value in [RawValue::Bool(true), RawValue::Other(serde_json::json!(5.0))] {
            let snapshot = interpret(&raw(&[("15", "Running".into()), ("106", value)]), &g30());
            assert_eq!(snapshot.lifecycle, LifecycleState::Error);
            assert_eq!(snapshot.error_code, None);
            assert_eq!(snapshot.error, None);
        }
    }

    #[test]
    fn falsy_error_values_are_no_error() {
        for value in [RawValue::Bool(false), RawValue::Other(serde_json::json!(0.0))] {
            let snapshot = interpret(&raw(&[("15", "Running".into()), ("106", value)]), &g30());
            assert_eq!(snapshot.lifecycle, LifecycleState::Cleaning);
        }
    }

    #[test]
    fn sleeping_with_no_error_string_is_idle() {
        let snapshot = interpret(
            &raw(&[("15", "Sleeping".into()), ("106", "no_error".into())]),
            &g30(),
        );
        assert_eq!(snapshot.lifecycle, LifecycleState::Idle);
        assert_eq!(snapshot.error.as_deref(), Some("no_error"));
    }

    #[test]
    fn state_tokens_map_to_lifecycle() {
        let cases = [
            ("Charging", LifecycleState::Docked),
            ("completed", LifecycleState::Docked),
            ("Recharge", LifecycleState::Returning),
            ("Sleeping", LifecycleState::Idle),
            ("standby", LifecycleState::Idle),
            ("Running", LifecycleState::Cleaning),
            ("Spot", LifecycleState::Cleaning),
        ];
        for (token, expected) in cases {
            assert_eq!(lifecycle_state(Some(token), false), expected, "{token}");
        }
    }

    #[test]
    fn absent_fields_stay_absent() {
        let snapshot = interpret(&raw(&[("15", "Running".into())]), &g30());
        assert_eq!(snapshot.lifecycle, LifecycleState::Cleaning);
        assert_eq!(snapshot.battery_level, None);
        assert_eq!(snapshot.error_code, None);
        assert_eq!(snapshot.fan_speed, None);
        assert_eq!(snapshot.mode, None);
        assert_eq!(snapshot.cleaning_area, None);
        assert_eq!(snapshot.auto_return, None);
        assert_eq!(snapshot.do_not_disturb, None);
        assert_eq!(snapshot.consumables, None);
    }

    #[test]
    fn malformed_values_are_dropped() {
        let snapshot = interpret(
            &raw(&[
                ("15", RawValue::Int(3)),
                ("104", RawValue::Int(250)),
                ("106", RawValue::Bool(true)),
                ("135", "yes".into()),
                ("142", "%%%".into()),
                ("110", RawValue::Other(serde_json::json!(1.5))),
            ]),
            &g30(),
        );
        assert_eq!(snapshot.lifecycle, LifecycleState::Error);
        assert_eq!(snapshot.battery_level, None);
        assert_eq!(snapshot.error_code, None);
        assert_eq!(snapshot.auto_return, None);
        assert_eq!(snapshot.consumables, None);
        assert_eq!(snapshot.cleaning_area, None);
    }

    #[test]
    fn g30_snapshot_is_copied_through() {
        let snapshot = interpret(
            &raw(&[
                ("15", "Running".into()),
                ("5", "auto".into()),
                ("104", RawValue::Int(87)),
                ("102", "Boost_IQ".into()),
                ("109", RawValue::Int(12)),
                ("110", RawValue::Int(9)),
                ("135", RawValue::Bool(true)),
                ("107", RawValue::Bool(false)),
                ("999", "future".into()),
            ]),
            &g30(),
        );
        assert_eq!(snapshot.mode.as_deref(), Some("auto"));
        assert_eq!(snapshot.battery_level, Some(87));
        assert_eq!(snapshot.fan_speed.as_deref(), Some("Boost IQ"));
        assert_eq!(snapshot.cleaning_time, Some(12));
        assert_eq!(snapshot.cleaning_area, Some(9));
        assert_eq!(snapshot.auto_return, Some(true));
        assert_eq!(snapshot.do_not_disturb, Some(false));
    }

    #[test]
    fn fields_are_extracted_even_when_profile_lacks_feature() {
        let c_series = resolve(&"T2118".into());
        let snapshot = interpret(
            &raw(&[("15", "Running".into()), ("118", RawValue::Bool(true))]),
            &c_series,
        );
        assert_eq!(snapshot.boost_iq, Some(true));
    }

    #[test]
    fn fan_speed_aliases_normalize_on_read() {
        for (token, label) in [("No_suction", "No Suction"), ("Quiet", "Pure"), ("Max", "Max")] {
            let snapshot = interpret(&raw(&[("102", token.into())]), &g30());
            assert_eq!(snapshot.fan_speed.as_deref(), Some(label));
        }
    }

    #[test]
    fn current_consumables_code_takes_priority() {
        let snapshot = interpret(
            &raw(&[
                // {'consumable': {'duration': 1234}}
                ("142", "eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9fQ==".into()),
                // {"consumable":{"duration":{"SB":12,"RB":30,"FM":7}}}
                (
                    "116",
                    "eyJjb25zdW1hYmxlIjp7ImR1cmF0aW9uIjp7IlNCIjoxMiwiUkIiOjMwLCJGTSI6N319fQ==".into(),
                ),
            ]),
            &g30(),
        );
        assert!(matches!(snapshot.consumables, Some(ConsumableWear::PerPart(_))));
    }

    #[test]
    fn legacy_consumables_used_when_current_is_corrupt() {
        let snapshot = interpret(
            &raw(&[
                ("116", "eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9".into()),
                ("142", "eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9fQ==".into()),
            ]),
            &g30(),
        );
        assert_eq!(snapshot.consumables, Some(ConsumableWear::Total(1234)));
    }

    #[test]
    fn interpretation_is_idempotent() {
        let input = raw(&[
            ("15", "Charging".into()),
            ("104", RawValue::Int(100)),
            ("106", RawValue::Int(0)),
        ]);
        assert_eq!(interpret(&input, &g30()), interpret(&input, &g30()));
    }
}
