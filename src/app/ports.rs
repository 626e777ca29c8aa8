//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RobotService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, display, event sinks, inbound
//! queues) implement these traits.  The
//! [`RobotService`](super::service::RobotService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Ports expose *raw* measurements and *fire-and-forget* writes.  Policy
//! (timeouts, clamping, duty cycles, latch logic) lives in the domain.

use crate::drivers::face::FaceFrame;
use crate::protocol::api::{ApiRequest, ApiResponse};
use crate::state::Motion;

use super::events::OutboundEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw sensor data.
pub trait SensorPort {
    /// Trigger one ultrasonic ping and return the echo pulse width in
    /// microseconds, or `None` if no echo completed within `timeout_us`.
    fn echo_pulse_us(&mut self, timeout_us: u32) -> Option<u32>;

    /// Raw 12-bit smoke sensor ADC value (0–4095), or `None` if the
    /// conversion failed.
    fn smoke_raw(&mut self) -> Option<u16>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
///
/// Writes never fail from the caller's point of view.
pub trait ActuatorPort {
    /// Drive both wheels for `motion` in a single call.
    /// [`Motion::Stopped`] brakes both sides with zero duty.
    fn apply_motion(&mut self, motion: Motion);

    fn set_buzzer(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// Face panel.  Only called when the rendered frame actually changes.
pub trait DisplayPort {
    fn render(&mut self, frame: &FaceFrame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`OutboundEvent`]s through this port.
/// Adapters decide where they go (serial log, websocket broadcast, ...).
pub trait EventSink {
    fn emit(&mut self, event: &OutboundEvent);
}

/// Fan one event stream out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &OutboundEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound port (driving adapter: transports → control loop)
// ───────────────────────────────────────────────────────────────

/// One item waiting for the control loop.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Raw websocket text frame (an envelope, possibly malformed).
    Frame(heapless::Vec<u8, 512>),
    /// A websocket client connected and wants a status snapshot.
    ClientConnected,
    /// A synchronous API request awaiting exactly one reply.
    Api(ApiRequest),
}

/// Queue of pending inbound items, drained once per loop iteration.
pub trait InboundPort {
    /// Next pending item, without blocking.
    fn poll(&mut self) -> Option<Inbound>;

    /// Deliver the reply to the most recent [`Inbound::Api`] request.
    fn reply(&mut self, response: ApiResponse);
}
