//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  Sensor readings are
//! scripted by the test.

use std::collections::VecDeque;

use emubot::app::control_loop::ControlLoop;
use emubot::app::events::OutboundEvent;
use emubot::app::ports::{ActuatorPort, DisplayPort, EventSink, Inbound, InboundPort, SensorPort};
use emubot::config::RobotConfig;
use emubot::drivers::face::FaceFrame;
use emubot::protocol::api::{ApiRequest, ApiResponse};
use emubot::state::Motion;
use serde_json::Value;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Motion(Motion),
    Buzzer(bool),
}

// ── MockHardware ──────────────────────────────────────────────

/// Echo width for a distance, inverse of the ranger conversion.
pub fn echo_for_cm(cm: f32) -> u32 {
    (cm * 2.0 / 0.034).round() as u32
}

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    /// Returned by every ping until changed.
    pub echo_us: Option<u32>,
    /// `None` models a failed ADC conversion.
    pub smoke_raw: Option<u16>,
    pub pings: u32,
    pub smoke_reads: u32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            echo_us: None,
            smoke_raw: Some(0),
            pings: 0,
            smoke_reads: 0,
        }
    }

    pub fn set_distance_cm(&mut self, cm: f32) {
        self.echo_us = Some(echo_for_cm(cm));
    }

    pub fn motion(&self) -> Motion {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Motion(m) => Some(*m),
                ActuatorCall::Buzzer(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn buzzer_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Buzzer(on) => Some(*on),
                ActuatorCall::Motion(_) => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn echo_pulse_us(&mut self, _timeout_us: u32) -> Option<u32> {
        self.pings += 1;
        self.echo_us
    }

    fn smoke_raw(&mut self) -> Option<u16> {
        self.smoke_reads += 1;
        self.smoke_raw
    }
}

impl ActuatorPort for MockHardware {
    fn apply_motion(&mut self, motion: Motion) {
        self.calls.push(ActuatorCall::Motion(motion));
    }

    fn set_buzzer(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Buzzer(on));
    }
}

// ── Recording sink ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<OutboundEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Acks and errors correlated with `id`, in order.
    pub fn outcomes_for(&self, id: &str) -> Vec<&OutboundEvent> {
        self.events
            .iter()
            .filter(|e| e.command_id() == Some(id))
            .collect()
    }

    pub fn acks_for(&self, id: &str) -> usize {
        self.outcomes_for(id)
            .iter()
            .filter(|e| matches!(e, OutboundEvent::CommandAck { .. }))
            .count()
    }

    pub fn errors_for(&self, id: &str) -> usize {
        self.outcomes_for(id)
            .iter()
            .filter(|e| matches!(e, OutboundEvent::Error { .. }))
            .count()
    }

    pub fn last_message_for(&self, id: &str) -> Option<String> {
        self.outcomes_for(id).last().map(|e| match e {
            OutboundEvent::CommandAck { message, .. } | OutboundEvent::Error { message, .. } => {
                message.to_string()
            }
            _ => String::new(),
        })
    }

    pub fn status_updates(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, OutboundEvent::StatusUpdate(_)))
            .count()
    }

    pub fn sensor_data(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, OutboundEvent::SensorData(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &OutboundEvent) {
        self.events.push(event.clone());
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<FaceFrame>,
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, frame: &FaceFrame) {
        self.frames.push(frame.clone());
    }
}

// ── Inbound queue ─────────────────────────────────────────────

#[derive(Default)]
pub struct VecInbound {
    pub pending: VecDeque<Inbound>,
    pub replies: Vec<ApiResponse>,
}

#[allow(dead_code)]
impl VecInbound {
    pub fn push_json(&mut self, value: &Value) {
        let bytes = serde_json::to_vec(value).unwrap();
        let mut frame = heapless::Vec::new();
        frame.extend_from_slice(&bytes).unwrap();
        self.pending.push_back(Inbound::Frame(frame));
    }

    pub fn push_api(&mut self, uri: &str) {
        self.pending
            .push_back(Inbound::Api(ApiRequest::from_uri(uri)));
    }
}

impl InboundPort for VecInbound {
    fn poll(&mut self) -> Option<Inbound> {
        self.pending.pop_front()
    }

    fn reply(&mut self, response: ApiResponse) {
        self.replies.push(response);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started control loop plus every mock it talks to.
pub struct Rig {
    pub control: ControlLoop,
    pub hw: MockHardware,
    pub display: MockDisplay,
    pub sink: RecordingSink,
    pub inbound: VecInbound,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(RobotConfig::default())
    }

    pub fn with_config(config: RobotConfig) -> Self {
        let mut hw = MockHardware::new();
        let mut control = ControlLoop::new(config);
        control.start(&mut hw, 0);
        Self {
            control,
            hw,
            display: MockDisplay::default(),
            sink: RecordingSink::new(),
            inbound: VecInbound::default(),
            now_ms: 0,
        }
    }

    /// One loop iteration at the current time.
    pub fn step(&mut self) {
        self.control.iterate(
            self.now_ms,
            &mut self.hw,
            &mut self.display,
            &mut self.sink,
            &mut self.inbound,
        );
    }

    /// Iterate every `loop_interval_ms` until `until_ms` (inclusive).
    pub fn run_until(&mut self, until_ms: u64) {
        let period = u64::from(self.control.service().config().loop_interval_ms);
        while self.now_ms < until_ms {
            self.now_ms = (self.now_ms + period).min(until_ms);
            self.step();
        }
    }

    /// Queue a command envelope and process it immediately.
    pub fn command(&mut self, id: &str, data: Value) {
        self.inbound.push_json(&serde_json::json!({
            "type": "command",
            "id": id,
            "data": data,
        }));
        self.step();
    }

    /// Send one API request and return its reply.
    pub fn api(&mut self, uri: &str) -> ApiResponse {
        self.inbound.push_api(uri);
        self.step();
        self.inbound.replies.pop().unwrap()
    }

    pub fn motion(&self) -> Motion {
        self.control.service().state().motion
    }

    pub fn armed(&self) -> bool {
        self.control.service().state().safety.armed
    }
}
