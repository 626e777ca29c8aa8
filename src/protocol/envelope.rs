//! JSON message envelope.
//!
//! Wire format (one websocket text frame per message):
//! ```text
//! { "type": "command" | "sensor_data" | "status_update" | "command_ack" | "error",
//!   "id":   "<correlation id>",        // inbound commands only
//!   "data": { ... },
//!   "timestamp": <ms since boot> }
//! ```
//!
//! Only `command` envelopes are accepted inbound.  Anything else is a
//! [`DecodeError`] and the frame is dropped without a reply.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::events::{CommandId, OutboundEvent, SensorTelemetry, StatusSnapshot};
use crate::config::Thresholds;
use crate::error::DecodeError;
use crate::state::{Expression, Reading, SensorEnables};

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// A command envelope with its correlation id; `data` is validated later
/// by [`RobotCommand::parse`](crate::app::commands::RobotCommand::parse).
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommand {
    pub id: CommandId,
    pub data: Map<String, Value>,
}

#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Value,
}

/// Decode one inbound frame.
///
/// A command whose `data` is absent or not an object still decodes (with
/// empty data) so the client gets a correlated "Missing action" error.
pub fn decode(bytes: &[u8]) -> Result<RawCommand, DecodeError> {
    let env: InboundEnvelope =
        serde_json::from_slice(bytes).map_err(|_| DecodeError::Malformed)?;
    if env.kind != "command" {
        return Err(DecodeError::NotACommand);
    }
    let id = match env.id {
        Some(Value::String(s)) if !s.is_empty() => parse_id(&s)?,
        Some(Value::Number(n)) => parse_id(&n.to_string())?,
        _ => return Err(DecodeError::MissingId),
    };
    let data = match env.data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(RawCommand { id, data })
}

fn parse_id(raw: &str) -> Result<CommandId, DecodeError> {
    CommandId::try_from(raw).map_err(|_| DecodeError::IdTooLong(raw.len()))
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: T,
    timestamp: u64,
}

/// A [`Reading`] on the wire: a number, or a sentinel string.
struct WireReading {
    reading: Reading,
    unavailable: &'static str,
}

impl Serialize for WireReading {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self.reading {
            Reading::Valid(v) => s.serialize_f32(v),
            Reading::Unavailable => s.serialize_str(self.unavailable),
            Reading::Disabled => s.serialize_str("disabled"),
        }
    }
}

/// `sensor_data.data`, also the `/sensor` response body.
#[derive(Serialize)]
pub struct SensorData {
    ultrasonic: WireReading,
    smoke: bool,
    #[serde(rename = "smokeLevel")]
    smoke_level: WireReading,
    proximity: &'static str,
    timestamp: u64,
}

impl From<&SensorTelemetry> for SensorData {
    fn from(t: &SensorTelemetry) -> Self {
        Self {
            ultrasonic: WireReading {
                reading: t.distance_cm,
                unavailable: "no_echo",
            },
            smoke: t.smoke_detected,
            smoke_level: WireReading {
                reading: t.smoke_pct,
                unavailable: "unavailable",
            },
            proximity: t.proximity.as_str(),
            timestamp: t.timestamp_ms,
        }
    }
}

#[derive(Serialize)]
struct Motors {
    left: i16,
    right: i16,
    direction: &'static str,
}

#[derive(Serialize)]
struct Oled<'a> {
    text: &'a str,
    expression: Expression,
    #[serde(rename = "effectiveExpression")]
    effective_expression: Expression,
    blinking: bool,
}

#[derive(Serialize)]
struct Safety {
    armed: bool,
    reason: Option<&'static str>,
}

/// `status_update.data`, also the `/status` response body.
#[derive(Serialize)]
pub struct StatusData<'a> {
    buzzer: bool,
    motors: Motors,
    oled: Oled<'a>,
    sensors: SensorEnables,
    thresholds: Thresholds,
    safety: Safety,
    timestamp: u64,
}

impl<'a> From<&'a StatusSnapshot> for StatusData<'a> {
    fn from(s: &'a StatusSnapshot) -> Self {
        let (left, right) = s.motion.wheel_speeds();
        Self {
            buzzer: s.buzzer_on,
            motors: Motors {
                left,
                right,
                direction: s.motion.label(),
            },
            oled: Oled {
                text: s.display_text.as_str(),
                expression: s.requested_expression,
                effective_expression: s.effective_expression,
                blinking: s.blinking,
            },
            sensors: s.sensors_enabled,
            thresholds: s.thresholds,
            safety: Safety {
                armed: s.safety.armed,
                reason: s.safety.reason.map(|r| r.as_str()),
            },
            timestamp: s.timestamp_ms,
        }
    }
}

#[derive(Serialize)]
struct Correlated<'a> {
    #[serde(rename = "commandId")]
    command_id: &'a str,
    message: &'a str,
}

/// Encode an outbound event.  Acks and errors are stamped with `now_ms`;
/// telemetry and status carry their capture time.
pub fn encode(event: &OutboundEvent, now_ms: u64) -> Result<Vec<u8>, serde_json::Error> {
    match event {
        OutboundEvent::SensorData(t) => serde_json::to_vec(&Envelope {
            kind: "sensor_data",
            data: SensorData::from(t),
            timestamp: t.timestamp_ms,
        }),
        OutboundEvent::StatusUpdate(s) => serde_json::to_vec(&Envelope {
            kind: "status_update",
            data: StatusData::from(s),
            timestamp: s.timestamp_ms,
        }),
        OutboundEvent::CommandAck {
            command_id,
            message,
        } => serde_json::to_vec(&Envelope {
            kind: "command_ack",
            data: Correlated {
                command_id: command_id.as_str(),
                message: message.as_str(),
            },
            timestamp: now_ms,
        }),
        OutboundEvent::Error {
            command_id,
            message,
        } => serde_json::to_vec(&Envelope {
            kind: "error",
            data: Correlated {
                command_id: command_id.as_str(),
                message: message.as_str(),
            },
            timestamp: now_ms,
        }),
    }
}
