use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model identifier assigned at discovery time, e.g. `"T2251"` or `"T2262A"`.
///
/// Only its prefix matters for capability resolution; the identifier itself
/// is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceModelId(String);

impl DeviceModelId {
    pub fn new(model: impl Into<String>) -> Self {
        Self(model.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceModelId {
    fn from(model: &str) -> Self {
        Self::new(model)
    }
}

impl From<String> for DeviceModelId {
    fn from(model: String) -> Self {
        Self(model)
    }
}

impl fmt::Display for DeviceModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hardware family a model prefix belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFamily {
    CSeries,
    GSeries,
    XSeries,
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::CSeries => write!(f, "C-series"),
            DeviceFamily::GSeries => write!(f, "G-series"),
            DeviceFamily::XSeries => write!(f, "X-series"),
        }
    }
}

/// Optional vendor features surfaced as extra attributes or named commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoboVacFeature {
    Edge,
    SmallRoom,
    CleaningTime,
    CleaningArea,
    DoNotDisturb,
    AutoReturn,
    Consumables,
    Room,
    Zone,
    Map,
    BoostIq,
}

/// Generic vacuum operations a host may offer for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VacuumFeature {
    Battery,
    FanSpeed,
    Locate,
    Pause,
    ReturnHome,
    SendCommand,
    Start,
    State,
    Stop,
    Map,
    CleanSpot,
}

/// A single feature a command depends on, from either feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequiredFeature {
    Surface(VacuumFeature),
    Extended(RoboVacFeature),
}

impl fmt::Display for RequiredFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredFeature::Surface(feature) => write!(f, "{feature:?}"),
            RequiredFeature::Extended(feature) => write!(f, "{feature:?}"),
        }
    }
}

/// Everything a physical unit supports, derived from its model prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// `None` for models outside every known family.
    pub family: Option<DeviceFamily>,
    /// Ordered fan-speed labels, as presented to the user.
    pub fan_speeds: Vec<String>,
    pub features: BTreeSet<RoboVacFeature>,
    pub control_surface: BTreeSet<VacuumFeature>,
}

impl CapabilityProfile {
    pub fn has_feature(&self, feature: RoboVacFeature) -> bool {
        self.features.contains(&feature)
    }

    pub fn has_control(&self, feature: VacuumFeature) -> bool {
        self.control_surface.contains(&feature)
    }

    pub fn supports(&self, required: RequiredFeature) -> bool {
        match required {
            RequiredFeature::Surface(feature) => self.has_control(feature),
            RequiredFeature::Extended(feature) => self.has_feature(feature),
        }
    }

    /// Return the vocabulary entry equal to `label`, if any.
    pub fn fan_speed(&self, label: &str) -> Option<&str> {
        self.fan_speeds
            .iter()
            .map(String::as_str)
            .find(|speed| *speed == label)
    }
}

/// A raw data-point value as reported by the device.
///
/// The local protocol is untyped per code; interpretation relies on the
/// static code table, never on which variant happens to arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Anything else the firmware sends (floats, null, nested JSON).
    Other(serde_json::Value),
}

impl RawValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            RawValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value, read as an error code, reports a fault.
    ///
    /// Only `0` (in any numeric shape, `false` included) and `"no_error"`
    /// mean "no error". A JSON `null` counts as an absent code.
    pub fn reports_fault(&self) -> bool {
        match self {
            RawValue::Bool(b) => *b,
            RawValue::Int(i) => *i != 0,
            RawValue::Text(s) => s != "no_error",
            RawValue::Other(serde_json::Value::Null) => false,
            RawValue::Other(serde_json::Value::Number(n)) => n.as_f64() != Some(0.0),
            RawValue::Other(_) => true,
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Int(i) => write!(f, "{i}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Other(v) => write!(f, "{v}"),
        }
    }
}

/// The data points last fetched from a device, keyed by DPS code.
///
/// May be partial: not every firmware reports every code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSnapshot(BTreeMap<String, RawValue>);

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&RawValue> {
        self.0.get(code)
    }

    pub fn insert(&mut self, code: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(code.into(), value.into());
    }

    /// Apply every write of `writes` in order, later writes winning.
    pub fn apply(&mut self, writes: &RawWriteSet) {
        for write in writes.iter() {
            self.0.insert(write.code.clone(), write.value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Vendor error code: numeric for physical-sensor faults, a short string for
/// software or module faults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Named(String),
}

impl ErrorCode {
    /// Read an error code from its raw value. Booleans and other shapes are
    /// not error codes.
    pub fn from_raw(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Int(i) => Some(ErrorCode::Numeric(*i)),
            RawValue::Text(s) => Some(ErrorCode::Named(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Numeric(code) => write!(f, "{code}"),
            ErrorCode::Named(code) => f.write_str(code),
        }
    }
}

/// Cumulative consumable wear read from the consumables record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsumableWear {
    Total(i64),
    /// Hours per part code, e.g. `"SB"` (side brush) or `"FM"` (filter).
    PerPart(BTreeMap<String, i64>),
}

/// Semantic lifecycle state presented to the controlling application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Cleaning,
    Idle,
    Docked,
    Returning,
    Error,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Cleaning => write!(f, "cleaning"),
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Docked => write!(f, "docked"),
            LifecycleState::Returning => write!(f, "returning"),
            LifecycleState::Error => write!(f, "error"),
        }
    }
}

/// Semantic device state, rebuilt in full from every raw snapshot.
///
/// Every field except `lifecycle` is `None` when its data point was absent
/// or malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub lifecycle: LifecycleState,
    /// Raw state token, e.g. `"Running"` or `"Charging"`.
    pub status: Option<String>,
    pub battery_level: Option<u8>,
    pub error_code: Option<ErrorCode>,
    /// Human-readable text for `error_code`, or the raw code when unknown.
    pub error: Option<String>,
    pub fan_speed: Option<String>,
    pub mode: Option<String>,
    pub cleaning_area: Option<i64>,
    pub cleaning_time: Option<i64>,
    pub auto_return: Option<bool>,
    pub do_not_disturb: Option<bool>,
    pub boost_iq: Option<bool>,
    pub consumables: Option<ConsumableWear>,
    pub locating: Option<bool>,
}

/// Device-family-specific actions carried by [`Command::SendNamed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedCommand {
    EdgeClean,
    SmallRoomClean,
    AutoClean,
    AutoReturn,
    DoNotDisturb,
    BoostIq,
    RoomClean,
}

impl NamedCommand {
    pub const ALL: [NamedCommand; 7] = [
        NamedCommand::EdgeClean,
        NamedCommand::SmallRoomClean,
        NamedCommand::AutoClean,
        NamedCommand::AutoReturn,
        NamedCommand::DoNotDisturb,
        NamedCommand::BoostIq,
        NamedCommand::RoomClean,
    ];

    /// The wire name used by hosts, e.g. `"roomClean"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamedCommand::EdgeClean => "edgeClean",
            NamedCommand::SmallRoomClean => "smallRoomClean",
            NamedCommand::AutoClean => "autoClean",
            NamedCommand::AutoReturn => "autoReturn",
            NamedCommand::DoNotDisturb => "doNotDisturb",
            NamedCommand::BoostIq => "boostIQ",
            NamedCommand::RoomClean => "roomClean",
        }
    }
}

impl FromStr for NamedCommand {
    type Err = RoboVacError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NamedCommand::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == name)
            .ok_or_else(|| RoboVacError::UnsupportedCommand {
                command: name.to_string(),
                reason: "unknown named command".to_string(),
            })
    }
}

impl fmt::Display for NamedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic command issued by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum Command {
    Locate,
    ReturnToBase,
    Start,
    Pause,
    Stop,
    CleanSpot,
    SetFanSpeed(String),
    SendNamed {
        name: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

impl Command {
    pub fn send(name: impl Into<String>, params: serde_json::Value) -> Self {
        Command::SendNamed {
            name: name.into(),
            params,
        }
    }

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &str {
        match self {
            Command::Locate => "locate",
            Command::ReturnToBase => "return_to_base",
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::CleanSpot => "clean_spot",
            Command::SetFanSpeed(_) => "set_fan_speed",
            Command::SendNamed { name, .. } => name,
        }
    }
}

/// One data-point write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWrite {
    pub code: String,
    pub value: RawValue,
}

impl RawWrite {
    pub fn new(code: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }
}

/// Ordered writes sent to the device as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawWriteSet(Vec<RawWrite>);

impl RawWriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(code: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self(vec![RawWrite::new(code, value)])
    }

    pub fn push(&mut self, code: impl Into<String>, value: impl Into<RawValue>) {
        self.0.push(RawWrite::new(code, value));
    }

    /// Value of the last write to `code`, if any.
    pub fn get(&self, code: &str) -> Option<&RawValue> {
        self.0.iter().rev().find(|w| w.code == code).map(|w| &w.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawWrite> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a RawWriteSet {
    type Item = &'a RawWrite;
    type IntoIter = std::slice::Iter<'a, RawWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Error type shared across the adaptation layer.
///
/// Only `UnsupportedCommand`, `InvalidCommand` and the transport-level
/// variants ever reach a host; decode failures are absorbed by the
/// interpreter.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoboVacError {
    #[error("Unsupported command '{command}': {reason}")]
    UnsupportedCommand { command: String, reason: String },

    #[error("Invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("Failed to decode data point {code}: {details}")]
    DecodeFailure { code: String, details: String },

    #[error("Transport error on {device}: {details}")]
    Transport { device: String, details: String },

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Poller for {0} has stopped")]
    PollerStopped(String),
}
