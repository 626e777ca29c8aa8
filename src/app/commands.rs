//! Inbound commands to the control core.
//!
//! A command envelope's `data` object is validated into a closed
//! [`RobotCommand`] before anything touches the robot.  Unknown actions and
//! bad parameters become a [`CommandError`] that names the action.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ThresholdsPatch;
use crate::error::{CommandError, token};
use crate::state::{Direction, DisplayText, Expression, SensorKind};

/// Commands that remote clients can send into the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotCommand {
    /// Drive in `direction`; stop automatically after `duration_ms` if given.
    Move {
        direction: Direction,
        duration_ms: Option<u32>,
    },

    /// Switch the buzzer; switch it back off after `duration_ms` if given.
    Buzzer { on: bool, duration_ms: Option<u32> },

    /// Replace the display line (already truncated).
    Oled { text: DisplayText },

    Expression(Expression),

    SensorToggle { sensor: SensorKind, enabled: bool },

    /// Merge new safety thresholds onto the current ones.
    SetThresholds(ThresholdsPatch),

    /// Autonomous forward / evade / turn / return routine.
    Patrol,

    /// Turn briefly, sample once, show the reading.
    Scan,
}

impl RobotCommand {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Buzzer { .. } => "buzzer",
            Self::Oled { .. } => "oled",
            Self::Expression(_) => "expression",
            Self::SensorToggle { .. } => "sensor_toggle",
            Self::SetThresholds(_) => "set_thresholds",
            Self::Patrol => "patrol",
            Self::Scan => "scan",
        }
    }

    /// Whether this command takes over the wheels.
    pub fn drives_wheels(&self) -> bool {
        matches!(
            self,
            Self::Move { .. } | Self::Patrol | Self::Scan
        )
    }

    /// Validate an envelope's `data` object.
    pub fn parse(data: &Map<String, Value>) -> Result<Self, CommandError> {
        let Some(Value::String(action)) = data.get("action") else {
            return Err(CommandError::MissingAction);
        };

        match action.as_str() {
            "move" => {
                let raw = required_str(data, "move", "direction")?;
                let direction = Direction::parse(raw)
                    .ok_or_else(|| CommandError::UnknownDirection(token(raw)))?;
                Ok(Self::Move {
                    direction,
                    duration_ms: duration_param(data, "move")?,
                })
            }
            "buzzer" => Ok(Self::Buzzer {
                on: switch_param(data, "buzzer", "state")?,
                duration_ms: duration_param(data, "buzzer")?,
            }),
            "oled" => Ok(Self::Oled {
                text: DisplayText::new(required_str(data, "oled", "text")?),
            }),
            "expression" => {
                let raw = required_str(data, "expression", "expression")?;
                Expression::parse(raw)
                    .map(Self::Expression)
                    .ok_or_else(|| CommandError::UnknownExpression(token(raw)))
            }
            "sensor_toggle" => {
                let raw = required_str(data, "sensor_toggle", "sensor")?;
                let sensor = SensorKind::parse(raw)
                    .ok_or_else(|| CommandError::UnknownSensor(token(raw)))?;
                Ok(Self::SensorToggle {
                    sensor,
                    enabled: switch_param(data, "sensor_toggle", "enabled")?,
                })
            }
            "set_thresholds" => {
                let missing = CommandError::MissingParameter {
                    action: "set_thresholds",
                    param: "thresholds",
                };
                let value = data.get("thresholds").ok_or_else(|| missing.clone())?;
                let patch = ThresholdsPatch::deserialize(value).map_err(|_| {
                    CommandError::InvalidParameter {
                        action: "set_thresholds",
                        param: "thresholds",
                    }
                })?;
                if patch.is_empty() {
                    return Err(missing);
                }
                Ok(Self::SetThresholds(patch))
            }
            "patrol" => Ok(Self::Patrol),
            "scan" => Ok(Self::Scan),
            other => Err(CommandError::UnknownAction(token(other))),
        }
    }
}

/// Interpret an on/off switch value as sent by the dashboard or a query
/// string.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

// ── Parameter helpers ─────────────────────────────────────────

fn required_str<'a>(
    data: &'a Map<String, Value>,
    action: &'static str,
    param: &'static str,
) -> Result<&'a str, CommandError> {
    match data.get(param) {
        Some(Value::String(s)) => Ok(s.as_str()),
        None | Some(Value::Null) => Err(CommandError::MissingParameter { action, param }),
        Some(_) => Err(CommandError::InvalidParameter { action, param }),
    }
}

fn switch_param(
    data: &Map<String, Value>,
    action: &'static str,
    param: &'static str,
) -> Result<bool, CommandError> {
    let invalid = CommandError::InvalidParameter { action, param };
    match data.get(param) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => parse_switch(s).ok_or(invalid),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid),
        },
        None | Some(Value::Null) => Err(CommandError::MissingParameter { action, param }),
        Some(_) => Err(invalid),
    }
}

/// Optional `duration_ms` (or the dashboard's `duration`) in milliseconds.
fn duration_param(
    data: &Map<String, Value>,
    action: &'static str,
) -> Result<Option<u32>, CommandError> {
    let Some(value) = data.get("duration_ms").or_else(|| data.get("duration")) else {
        return Ok(None);
    };
    let invalid = CommandError::InvalidParameter {
        action,
        param: "duration_ms",
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let ms = n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
                .ok_or_else(|| invalid.clone())?;
            u32::try_from(ms).map(Some).map_err(|_| invalid)
        }
        _ => Err(invalid),
    }
}
