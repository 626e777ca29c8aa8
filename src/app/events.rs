//! Outbound application events.
//!
//! The [`RobotService`](super::service::RobotService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, encode into a wire
//! envelope and broadcast, etc.

use core::fmt::{self, Write as _};

use crate::config::Thresholds;
use crate::state::{
    DisplayText, Expression, Motion, Proximity, Reading, RobotState, SafetyLatch, SensorEnables,
};

/// Longest correlation id accepted on an inbound command, in bytes.
pub const MAX_COMMAND_ID_LEN: usize = 64;

/// Correlation id copied from an inbound command.
pub type CommandId = heapless::String<MAX_COMMAND_ID_LEN>;

/// Human-readable ack / error text.
pub type Message = heapless::String<96>;

/// Synthetic correlation id used when the safety monitor stops the robot.
pub const AUTO_STOP_ID: &str = "auto_stop";

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    /// Periodic sensor telemetry, once per sample period.
    SensorData(SensorTelemetry),

    /// Snapshot of the robot state.
    StatusUpdate(StatusSnapshot),

    /// A command (or the safety monitor) completed successfully.
    CommandAck { command_id: CommandId, message: Message },

    /// A command was rejected or aborted.
    Error { command_id: CommandId, message: Message },
}

impl OutboundEvent {
    pub fn ack(command_id: &str, message: impl fmt::Display) -> Self {
        Self::CommandAck {
            command_id: crate::state::bounded(command_id),
            message: self::message(message),
        }
    }

    pub fn error(command_id: &str, message: impl fmt::Display) -> Self {
        Self::Error {
            command_id: crate::state::bounded(command_id),
            message: self::message(message),
        }
    }

    /// Correlation id, for acks and errors.
    pub fn command_id(&self) -> Option<&str> {
        match self {
            Self::CommandAck { command_id, .. } | Self::Error { command_id, .. } => {
                Some(command_id.as_str())
            }
            Self::SensorData(_) | Self::StatusUpdate(_) => None,
        }
    }
}

/// Format into a bounded message; overlong text is cut short.
pub fn message(message: impl fmt::Display) -> Message {
    let mut out = Message::new();
    if write!(out, "{message}").is_err() {
        log::debug!("event message truncated to {} bytes", out.len());
    }
    out
}

/// A point-in-time sensor reading suitable for transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorTelemetry {
    pub distance_cm: Reading,
    pub smoke_pct: Reading,
    pub smoke_detected: bool,
    pub proximity: Proximity,
    pub timestamp_ms: u64,
}

impl SensorTelemetry {
    pub fn capture(state: &RobotState, now_ms: u64) -> Self {
        Self {
            distance_cm: state.last_sample.distance_cm,
            smoke_pct: state.last_sample.smoke_pct,
            smoke_detected: state.smoke_detected(),
            proximity: state.proximity(),
            timestamp_ms: now_ms,
        }
    }
}

/// The client-relevant subset of [`RobotState`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub buzzer_on: bool,
    pub motion: Motion,
    pub display_text: DisplayText,
    pub requested_expression: Expression,
    pub effective_expression: Expression,
    pub blinking: bool,
    pub sensors_enabled: SensorEnables,
    pub thresholds: Thresholds,
    pub safety: SafetyLatch,
    pub timestamp_ms: u64,
}

impl StatusSnapshot {
    pub fn capture(state: &RobotState, now_ms: u64) -> Self {
        Self {
            buzzer_on: state.buzzer_on,
            motion: state.motion,
            display_text: state.display_text.clone(),
            requested_expression: state.requested_expression,
            effective_expression: state.effective_expression,
            blinking: state.blink.is_blinking,
            sensors_enabled: state.sensors_enabled,
            thresholds: state.thresholds(),
            safety: state.safety,
            timestamp_ms: now_ms,
        }
    }
}
