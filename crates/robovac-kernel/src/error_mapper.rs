//! Vendor error code to human-readable text.
//!
//! The text is advisory only and is never used for control decisions.
//! Unknown codes pass through as their raw representation.

use robovac_types::ErrorCode;

const NUMERIC_ERRORS: &[(i64, &str)] = &[
    (1, "Error: Front bumper stuck"),
    (2, "Error: Wheel stuck"),
    (3, "Error: Side brush"),
    (4, "Error: Rolling brush bar stuck"),
    (5, "Error: Device trapped"),
    (6, "Error: Device trapped"),
    (7, "Error: Wheel suspended"),
    (8, "Error: Low battery"),
    (9, "Error: Magnetic boundary"),
    (12, "Error: Right wall sensor"),
    (13, "Error: Device tilted"),
    (14, "Error: Insert dust collector"),
    (17, "Error: Restricted area detected"),
    (18, "Error: Laser cover stuck"),
    (19, "Error: Laser sesor stuck"),
    (20, "Error: Laser sensor blocked"),
    (21, "Error: Base blocked"),
];

const NAMED_ERRORS: &[(&str, &str)] = &[
    ("IP_ADDRESS", "IP Address not set"),
    ("S1", "Error: Battery"),
    ("S2", "Error: Wheel Module"),
    ("S3", "Error: Side Brush"),
    ("S4", "Error: Suction Fan"),
    ("S5", "Error: Rolling Brush"),
    ("S8", "Error: Path Tracking Sensor"),
    ("Wheel_stuck", "Error: Wheel stuck"),
    ("R_brush_stuck", "Error: Rolling brush stuck"),
    ("Crash_bar_stuck", "Error: Front bumper stuck"),
    ("sensor_dirty", "Error: Sensor dirty"),
    ("N_enough_pow", "Error: Low battery"),
    ("Stuck_5_min", "Error: Device trapped"),
    ("Fan_stuck", "Error: Fan stuck"),
    ("S_brush_stuck", "Error: Side brush stuck"),
];

/// Known text for `code`, if any.
pub fn lookup(code: &ErrorCode) -> Option<&'static str> {
    match code {
        ErrorCode::Numeric(n) => NUMERIC_ERRORS
            .iter()
            .find(|(known, _)| known == n)
            .map(|(_, text)| *text),
        ErrorCode::Named(name) => NAMED_ERRORS
            .iter()
            .find(|(known, _)| *known == name.as_str())
            .map(|(_, text)| *text),
    }
}

/// Describe `code`, falling back to its raw form.
///
/// ```
/// use robovac_kernel::error_mapper::describe;
/// use robovac_types::ErrorCode;
///
/// assert_eq!(describe(&ErrorCode::Numeric(2)), "Error: Wheel stuck");
/// assert_eq!(describe(&ErrorCode::Named("S99".into())), "S99");
/// ```
pub fn describe(code: &ErrorCode) -> String {
    lookup(code).map_or_else(|| code.to_string(), str::to_string)
}
