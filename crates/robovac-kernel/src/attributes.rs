//! Profile-gated attribute map for presentation layers.
//!
//! The interpreter extracts everything a device reports.  Hosts that show
//! extra attributes use [`exposed_attributes`] to keep only those the
//! device's profile advertises.

use robovac_types::{CapabilityProfile, DeviceSnapshot, RoboVacFeature, VacuumFeature};
use serde_json::{Map, Value, json};

pub const ATTR_ERROR: &str = "error";
pub const ATTR_BATTERY_LEVEL: &str = "battery_level";
pub const ATTR_FAN_SPEED: &str = "fan_speed";
pub const ATTR_STATUS: &str = "status";
pub const ATTR_CLEANING_AREA: &str = "cleaning_area";
pub const ATTR_CLEANING_TIME: &str = "cleaning_time";
pub const ATTR_AUTO_RETURN: &str = "auto_return";
pub const ATTR_DO_NOT_DISTURB: &str = "do_not_disturb";
pub const ATTR_BOOST_IQ: &str = "boost_iq";
pub const ATTR_CONSUMABLES: &str = "consumables";
pub const ATTR_MODE: &str = "mode";

/// Build the attribute map for `snapshot`.
///
/// `error` and `mode` are always present; every other key appears only when
/// the profile carries the matching feature.  A present key whose value was
/// not reported maps to `null`.
pub fn exposed_attributes(snapshot: &DeviceSnapshot, profile: &CapabilityProfile) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert(ATTR_ERROR.into(), json!(snapshot.error));

    if profile.has_control(VacuumFeature::Battery) {
        attrs.insert(ATTR_BATTERY_LEVEL.into(), json!(snapshot.battery_level));
    }
    if profile.has_control(VacuumFeature::FanSpeed) {
        attrs.insert(ATTR_FAN_SPEED.into(), json!(snapshot.fan_speed));
    }
    if profile.has_control(VacuumFeature::State) {
        attrs.insert(ATTR_STATUS.into(), json!(snapshot.lifecycle));
    }

    let gated = [
        (RoboVacFeature::CleaningArea, ATTR_CLEANING_AREA, json!(snapshot.cleaning_area)),
        (RoboVacFeature::CleaningTime, ATTR_CLEANING_TIME, json!(snapshot.cleaning_time)),
        (RoboVacFeature::AutoReturn, ATTR_AUTO_RETURN, json!(snapshot.auto_return)),
        (RoboVacFeature::DoNotDisturb, ATTR_DO_NOT_DISTURB, json!(snapshot.do_not_disturb)),
        (RoboVacFeature::BoostIq, ATTR_BOOST_IQ, json!(snapshot.boost_iq)),
        (RoboVacFeature::Consumables, ATTR_CONSUMABLES, json!(snapshot.consumables)),
    ];
    for (feature, key, value) in gated {
        if profile.has_feature(feature) {
            attrs.insert(key.into(), value);
        }
    }

    attrs.insert(ATTR_MODE.into(), json!(snapshot.mode));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability_resolver::resolve;
    use crate::interpreter::interpret;
    use robovac_types::{RawSnapshot, RawValue};

    fn reported() -> RawSnapshot {
        [
            ("15", RawValue::from("Running")),
            ("104", RawValue::Int(64)),
            ("102", RawValue::from("Turbo")),
            ("110", RawValue::Int(20)),
            ("118", RawValue::Bool(true)),
            ("5", RawValue::from("auto")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn g_series_hides_boost_iq() {
        let profile = resolve(&"T2252".into());
        let attrs = exposed_attributes(&interpret(&reported(), &profile), &profile);
        assert_eq!(attrs[ATTR_BATTERY_LEVEL], 64);
        assert_eq!(attrs[ATTR_STATUS], "cleaning");
        assert_eq!(attrs[ATTR_CLEANING_AREA], 20);
        assert!(attrs[ATTR_CONSUMABLES].is_null());
        assert!(!attrs.contains_key(ATTR_BOOST_IQ));
    }

    #[test]
    fn x_series_shows_boost_iq() {
        let profile = resolve(&"T2262A".into());
        let attrs = exposed_attributes(&interpret(&reported(), &profile), &profile);
        assert_eq!(attrs[ATTR_BOOST_IQ], true);
    }

    #[test]
    fn unknown_model_keeps_only_error_and_mode() {
        let profile = resolve(&"Q1".into());
        let attrs = exposed_attributes(&interpret(&reported(), &profile), &profile);
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(attrs.contains_key(ATTR_ERROR));
        assert_eq!(attrs[ATTR_MODE], "auto");
    }
}
