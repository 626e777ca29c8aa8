//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every outbound event to the
//! ESP-IDF logger (UART / USB-CDC in production).  Paired with the
//! websocket sink through the tuple fan-out in the device binary.

use log::{info, warn};

use crate::app::events::OutboundEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`OutboundEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &OutboundEvent) {
        match event {
            OutboundEvent::SensorData(t) => {
                info!(
                    "SENSE | dist={}cm ({}) | smoke={}%{} | t={}ms",
                    t.distance_cm,
                    t.proximity.as_str(),
                    t.smoke_pct,
                    if t.smoke_detected { " DETECTED" } else { "" },
                    t.timestamp_ms,
                );
            }
            OutboundEvent::StatusUpdate(s) => {
                let (left, right) = s.motion.wheel_speeds();
                info!(
                    "STATUS | motion={} ({left},{right}) | buzzer={} | face={}/{}{} | \
                     text=\"{}\" | latch={}",
                    s.motion.label(),
                    if s.buzzer_on { "on" } else { "off" },
                    s.requested_expression.as_str(),
                    s.effective_expression.as_str(),
                    if s.blinking { " (blink)" } else { "" },
                    s.display_text,
                    match s.safety.reason {
                        Some(reason) if s.safety.armed => reason.as_str(),
                        _ => "clear",
                    },
                );
            }
            OutboundEvent::CommandAck {
                command_id,
                message,
            } => {
                info!("ACK | {command_id} | {message}");
            }
            OutboundEvent::Error {
                command_id,
                message,
            } => {
                warn!("ERROR | {command_id} | {message}");
            }
        }
    }
}
