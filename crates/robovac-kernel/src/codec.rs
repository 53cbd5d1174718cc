//! Compound-field codec for the opaque blob data points.
//!
//! Blobs are standard base64 over a textual payload:
//!
//! | Data point | Payload |
//! |---|---|
//! | consumables (`116` / `142`) | a dictionary literal holding `consumable.duration` |
//! | do-not-disturb schedule (`139`) | one of two fixed schedule strings |
//! | room-clean request (`124`) | compact JSON `{"method":"selectRoomsClean","data":{..},"timestamp":ms}` |

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use robovac_types::{ConsumableWear, RoboVacError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schedule written when do-not-disturb is switched on (restricted window).
pub const DND_ENABLED_SCHEDULE: &str = "MTAwMDAwMDAw";
/// Schedule written when do-not-disturb is switched off (all day allowed).
pub const DND_DISABLED_SCHEDULE: &str = "MEQ4MDAwMDAw";

const ROOM_CLEAN_METHOD: &str = "selectRoomsClean";

/// Failure at one stage of decoding a blob.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not ASCII text")]
    NotText,

    #[error("payload is not a valid structure: {0}")]
    Structure(#[from] serde_json::Error),

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("unexpected shape for {field}: {found}")]
    UnexpectedShape { field: &'static str, found: String },
}

impl CodecError {
    /// Lift into the shared error type, tagged with the data point the blob
    /// came from.
    pub fn at(self, code: &str) -> RoboVacError {
        RoboVacError::DecodeFailure {
            code: code.to_string(),
            details: self.to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

/// Time source for payloads that carry a timestamp.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Consumables
// ────────────────────────────────────────────────────────────────────────────

/// Extract `consumable.duration` from a consumables blob.
///
/// The payload is JSON on current firmware and a Python-style literal
/// (single quotes, `True`/`False`/`None`) on older firmware; both are
/// accepted.
///
/// ```
/// use robovac_kernel::codec::decode_consumables;
/// use robovac_types::{ConsumableWear, RoboVacError};
///
/// // {'consumable': {'duration': 1234}}
/// let wear = decode_consumables("eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9fQ==").unwrap();
/// assert_eq!(wear, ConsumableWear::Total(1234));
/// ```
pub fn decode_consumables(blob: &str) -> Result<ConsumableWear, CodecError> {
    let bytes = STANDARD.decode(blob.trim())?;
    if !bytes.is_ascii() {
        return Err(CodecError::NotText);
    }
    let text = String::from_utf8(bytes).map_err(|_| CodecError::NotText)?;
    let record = parse_literal(&text)?;

    let duration = record
        .get("consumable")
        .and_then(|c| c.get("duration"))
        .ok_or(CodecError::MissingField("consumable.duration"))?;

    if let Some(total) = duration.as_i64() {
        return Ok(ConsumableWear::Total(total));
    }
    if let Some(parts) = duration.as_object() {
        let mut wear = BTreeMap::new();
        for (part, hours) in parts {
            let hours = hours.as_i64().ok_or_else(|| CodecError::UnexpectedShape {
                field: "consumable.duration",
                found: hours.to_string(),
            })?;
            wear.insert(part.clone(), hours);
        }
        return Ok(ConsumableWear::PerPart(wear));
    }
    Err(CodecError::UnexpectedShape {
        field: "consumable.duration",
        found: duration.to_string(),
    })
}

fn parse_literal(text: &str) -> Result<Value, CodecError> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::from_str(&python_literal_to_json(text))?),
    }
}

/// Rewrite a Python dictionary literal into JSON: single-quoted strings
/// become double-quoted and `True`/`False`/`None` become JSON literals.
/// Text inside strings is left untouched.
fn python_literal_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                c if c == q => {
                    out.push('"');
                    quote = None;
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            word.push(c);
            continue;
        }
        flush_word(&mut word, &mut out);
        if c == '\'' || c == '"' {
            out.push('"');
            quote = Some(c);
        } else {
            out.push(c);
        }
    }
    flush_word(&mut word, &mut out);
    out
}

fn flush_word(word: &mut String, out: &mut String) {
    match word.as_str() {
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" => out.push_str("null"),
        other => out.push_str(other),
    }
    word.clear();
}

// ────────────────────────────────────────────────────────────────────────────
// Do-not-disturb schedule
// ────────────────────────────────────────────────────────────────────────────

/// Pick the canonical schedule blob for a do-not-disturb state.
///
/// This is a toggle between two fixed schedules, not a general encoder.
pub fn encode_do_not_disturb_window(enabled: bool) -> &'static str {
    if enabled {
        DND_ENABLED_SCHEDULE
    } else {
        DND_DISABLED_SCHEDULE
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Room-clean request
// ────────────────────────────────────────────────────────────────────────────

/// Rooms selected for a room-clean run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSelection {
    #[serde(rename = "roomIds")]
    pub room_ids: Vec<u32>,
    #[serde(rename = "cleanTimes")]
    pub clean_times: u32,
}

/// Method call carried by the room-clean data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCleanRequest {
    pub method: String,
    pub data: RoomSelection,
    pub timestamp: i64,
}

/// Build, serialize and base64-encode a room-clean request stamped with
/// `clock`.
pub fn encode_room_clean_request(
    room_ids: &[u32],
    repeat_count: u32,
    clock: &dyn Clock,
) -> Result<String, CodecError> {
    let request = RoomCleanRequest {
        method: ROOM_CLEAN_METHOD.to_string(),
        data: RoomSelection {
            room_ids: room_ids.to_vec(),
            clean_times: repeat_count,
        },
        timestamp: clock.now_millis(),
    };
    let json = serde_json::to_string(&request)?;
    tracing::debug!(payload = %json, "encoded room-clean request");
    Ok(STANDARD.encode(json))
}

/// Decode a room-clean blob back into its request.
pub fn decode_room_clean_request(blob: &str) -> Result<RoomCleanRequest, CodecError> {
    let bytes = STANDARD.decode(blob.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_lifts_to_decode_failure() {
        let err = decode_consumables("not base64!").unwrap_err().at("116");
        assert!(matches!(err, RoboVacError::DecodeFailure { ref code, .. } if code == "116"));
    }

    #[test]
    fn decodes_python_literal_total() {
        // {'consumable': {'duration': 1234}}
        let wear = decode_consumables("eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9fQ==").unwrap();
        assert_eq!(wear, ConsumableWear::Total(1234));
    }

    #[test]
    fn decodes_json_per_part() {
        // {"consumable":{"duration":{"SB":12,"RB":30,"FM":7}}}
        let wear = decode_consumables(
            "eyJjb25zdW1hYmxlIjp7ImR1cmF0aW9uIjp7IlNCIjoxMiwiUkIiOjMwLCJGTSI6N319fQ==",
        )
        .unwrap();
        let ConsumableWear::PerPart(parts) = wear else {
            panic!("expected per-part wear");
        };
        assert_eq!(parts["SB"], 12);
        assert_eq!(parts["RB"], 30);
        assert_eq!(parts["FM"], 7);
    }

    #[test]
    fn decodes_python_literal_with_keywords() {
        // {'consumable': {'duration': {'SB': 12, 'RB': 30}, 'enabled': True, 'note': None}}
        let wear = decode_consumables(
            "eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IHsnU0InOiAxMiwgJ1JCJzogMzB9LCAnZW5hYmxlZCc6IFRydWUsICdub3RlJzogTm9uZX19",
        )
        .unwrap();
        assert!(matches!(wear, ConsumableWear::PerPart(ref p) if p.len() == 2));
    }

    #[test]
    fn truncated_blob_fails_closed() {
        // Closing brace missing.
        let result = decode_consumables("eydjb25zdW1hYmxlJzogeydkdXJhdGlvbic6IDEyMzR9");
        assert!(matches!(result, Err(CodecError::Structure(_))));
    }

    #[test]
    fn corrupt_base64_fails_closed() {
        assert!(matches!(
            decode_consumables("!!not base64!!"),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn missing_duration_is_reported() {
        // {"other":1}
        assert!(matches!(
            decode_consumables("eyJvdGhlciI6MX0="),
            Err(CodecError::MissingField(_))
        ));
    }

    #[test]
    fn non_ascii_payload_is_rejected() {
        let blob = STANDARD.encode("{\"consumable\":{\"duration\":\"ü\"}}");
        assert!(matches!(decode_consumables(&blob), Err(CodecError::NotText)));
    }

    #[test]
    fn python_literal_conversion_leaves_strings_alone() {
        let json = python_literal_to_json("{'a': 'True story', 'b': None, 'c': \"it's\"}");
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["a"], "True story");
        assert!(value["b"].is_null());
        assert_eq!(value["c"], "it's");
    }

    #[test]
    fn dnd_schedules_are_complementary() {
        assert_eq!(encode_do_not_disturb_window(true), "MTAwMDAwMDAw");
        assert_eq!(encode_do_not_disturb_window(false), "MEQ4MDAwMDAw");
        assert_ne!(
            encode_do_not_disturb_window(true),
            encode_do_not_disturb_window(false)
        );
    }

    #[test]
    fn room_clean_request_matches_vendor_layout() {
        let blob = encode_room_clean_request(&[3, 5], 2, &FixedClock(1_700_000_000_000)).unwrap();
        assert_eq!(
            blob,
            "eyJtZXRob2QiOiJzZWxlY3RSb29tc0NsZWFuIiwiZGF0YSI6eyJyb29tSWRzIjpbMyw1XSwiY2xlYW5UaW1lcyI6Mn0sInRpbWVzdGFtcCI6MTcwMDAwMDAwMDAwMH0="
        );
    }

    #[test]
    fn room_clean_request_structure_ignoring_timestamp() {
        let blob = encode_room_clean_request(&[1], 1, &SystemClock).unwrap();
        let request = decode_room_clean_request(&blob).unwrap();
        assert_eq!(request.method, "selectRoomsClean");
        assert_eq!(
            request.data,
            RoomSelection {
                room_ids: vec![1],
                clean_times: 1
            }
        );
        assert!(request.timestamp > 0);
    }
}
