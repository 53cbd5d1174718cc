//! Static data-point (DPS) code table.
//!
//! Every attribute of the local protocol is addressed by a short numeric
//! string.  The value kind of each code is fixed here; readers must never
//! infer it from whatever value a firmware happens to send.

use robovac_types::{RawSnapshot, RawValue};

/// Value kind carried by a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    String,
    /// Numeric physical-sensor codes or short-string module codes.
    IntegerOrString,
    /// Base64 text wrapping a serialized structure.
    Blob,
}

/// Known data-point codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DpsCode {
    PlayPause,
    Mode,
    State,
    ReturnHome,
    FanSpeed,
    Locate,
    BatteryLevel,
    ErrorCode,
    DoNotDisturb,
    CleaningTime,
    CleaningArea,
    Consumables,
    BoostIq,
    RoomClean,
    AutoReturn,
    DoNotDisturbSchedule,
    LegacyConsumables,
}

impl DpsCode {
    pub const ALL: [DpsCode; 17] = [
        DpsCode::PlayPause,
        DpsCode::Mode,
        DpsCode::State,
        DpsCode::ReturnHome,
        DpsCode::FanSpeed,
        DpsCode::Locate,
        DpsCode::BatteryLevel,
        DpsCode::ErrorCode,
        DpsCode::DoNotDisturb,
        DpsCode::CleaningTime,
        DpsCode::CleaningArea,
        DpsCode::Consumables,
        DpsCode::BoostIq,
        DpsCode::RoomClean,
        DpsCode::AutoReturn,
        DpsCode::DoNotDisturbSchedule,
        DpsCode::LegacyConsumables,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DpsCode::PlayPause => "2",
            DpsCode::Mode => "5",
            DpsCode::State => "15",
            DpsCode::ReturnHome => "101",
            DpsCode::FanSpeed => "102",
            DpsCode::Locate => "103",
            DpsCode::BatteryLevel => "104",
            DpsCode::ErrorCode => "106",
            DpsCode::DoNotDisturb => "107",
            DpsCode::CleaningTime => "109",
            DpsCode::CleaningArea => "110",
            DpsCode::Consumables => "116",
            DpsCode::BoostIq => "118",
            DpsCode::RoomClean => "124",
            DpsCode::AutoReturn => "135",
            DpsCode::DoNotDisturbSchedule => "139",
            DpsCode::LegacyConsumables => "142",
        }
    }

    pub const fn kind(self) -> ValueKind {
        match self {
            DpsCode::PlayPause
            | DpsCode::ReturnHome
            | DpsCode::Locate
            | DpsCode::DoNotDisturb
            | DpsCode::BoostIq
            | DpsCode::AutoReturn => ValueKind::Boolean,
            DpsCode::BatteryLevel | DpsCode::CleaningTime | DpsCode::CleaningArea => {
                ValueKind::Integer
            }
            DpsCode::Mode | DpsCode::State | DpsCode::FanSpeed => ValueKind::String,
            DpsCode::ErrorCode => ValueKind::IntegerOrString,
            DpsCode::Consumables
            | DpsCode::RoomClean
            | DpsCode::DoNotDisturbSchedule
            | DpsCode::LegacyConsumables => ValueKind::Blob,
        }
    }

    /// Look up a raw code.  Unknown codes return `None` and are left alone
    /// by every reader.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Whether `value` has the kind this code is declared with.
    pub fn accepts(self, value: &RawValue) -> bool {
        match (self.kind(), value) {
            (ValueKind::Boolean, RawValue::Bool(_)) => true,
            (ValueKind::Integer, RawValue::Int(_)) => true,
            (ValueKind::String | ValueKind::Blob, RawValue::Text(_)) => true,
            (ValueKind::IntegerOrString, RawValue::Int(_) | RawValue::Text(_)) => true,
            _ => false,
        }
    }
}

/// Typed reads over a [`RawSnapshot`] that honour the code table.
///
/// A value of the wrong kind reads as absent.
pub trait DpsRead {
    fn dps(&self, code: DpsCode) -> Option<&RawValue>;

    fn dps_bool(&self, code: DpsCode) -> Option<bool> {
        self.dps(code).and_then(RawValue::as_bool)
    }

    fn dps_int(&self, code: DpsCode) -> Option<i64> {
        self.dps(code).and_then(RawValue::as_int)
    }

    fn dps_str(&self, code: DpsCode) -> Option<&str> {
        self.dps(code).and_then(RawValue::as_str)
    }
}

impl DpsRead for RawSnapshot {
    fn dps(&self, code: DpsCode) -> Option<&RawValue> {
        self.get(code.as_str()).filter(|value| code.accepts(value))
    }
}

/// Raw fan-speed tokens that differ from their user-facing label.
///
/// Applied raw → label on read and label → raw on write.
pub const FAN_SPEED_ALIASES: [(&str, &str); 3] = [
    ("No_suction", "No Suction"),
    ("Boost_IQ", "Boost IQ"),
    ("Quiet", "Pure"),
];

/// Normalize a raw fan-speed token into its user-facing label.
pub fn fan_speed_label(token: &str) -> &str {
    FAN_SPEED_ALIASES
        .iter()
        .find(|(raw, _)| *raw == token)
        .map_or(token, |(_, label)| *label)
}

/// Map a user-facing fan-speed label back to the raw token the device expects.
pub fn fan_speed_token(label: &str) -> &str {
    FAN_SPEED_ALIASES
        .iter()
        .find(|(_, l)| *l == label)
        .map_or(label, |(raw, _)| *raw)
}
