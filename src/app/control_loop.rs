//! The periodic control loop.
//!
//! One [`ControlLoop::iterate`] call is one pass of the reactive core:
//!
//! 1. drain inbound frames, connects and API requests (bounded);
//! 2. fire due deadlines (timed stop, buzzer off, routine steps);
//! 3. sample sensors and evaluate the safety latch when a period elapsed;
//! 4. advance the blink timer and redraw the face if it changed.
//!
//! The caller owns the clock and the sleep between iterations.

use log::debug;

use crate::config::RobotConfig;

use super::ports::{ActuatorPort, DisplayPort, EventSink, Inbound, InboundPort, SensorPort};
use super::service::RobotService;

/// Inbound items handled per iteration; the rest wait for the next pass.
pub const MAX_INBOUND_PER_ITERATION: usize = 16;

pub struct ControlLoop {
    service: RobotService,
}

impl ControlLoop {
    pub fn new(config: RobotConfig) -> Self {
        Self {
            service: RobotService::new(config),
        }
    }

    /// Safe-state the actuators and arm the face timers.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, now_ms: u64) {
        self.service.start(hw, now_ms);
    }

    pub fn service(&self) -> &RobotService {
        &self.service
    }

    pub fn iterate<H, D, S, I>(
        &mut self,
        now_ms: u64,
        hw: &mut H,
        display: &mut D,
        sink: &mut S,
        inbound: &mut I,
    ) where
        H: SensorPort + ActuatorPort,
        D: DisplayPort,
        S: EventSink,
        I: InboundPort,
    {
        self.drain_inbound(now_ms, hw, sink, inbound);
        self.service.run_deadlines(hw, sink, now_ms);
        if self.service.sample_due(now_ms) {
            self.service.sample_and_evaluate(hw, sink, now_ms);
        }
        self.service.tick_face(display, now_ms);
    }

    fn drain_inbound(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        inbound: &mut impl InboundPort,
    ) {
        for handled in 0..MAX_INBOUND_PER_ITERATION {
            let Some(item) = inbound.poll() else {
                if handled > 0 {
                    debug!("loop: handled {handled} inbound item(s)");
                }
                return;
            };
            match item {
                Inbound::Frame(bytes) => self.service.handle_frame(&bytes, hw, sink, now_ms),
                Inbound::ClientConnected => self.service.connected(sink, now_ms),
                Inbound::Api(request) => {
                    let response = self.service.handle_api(request, hw, sink, now_ms);
                    inbound.reply(response);
                }
            }
        }
        debug!("loop: inbound budget spent, deferring the rest");
    }
}
