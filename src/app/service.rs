//! Application service, the hexagonal core.
//!
//! [`RobotService`] owns the robot state, the safety monitor, the
//! expression state machine, the deadline scheduler and any running
//! routine.  All I/O flows through port traits injected at call sites, so
//! the whole service is testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │         RobotService          │
//! ActuatorPort ◀──│ Safety · Expression · Routine │ ──▶ DisplayPort
//!                 └──────────────────────────────┘
//! ```
//!
//! Command handling lives in [`dispatch`](super::dispatch).

use log::{info, warn};

use crate::config::RobotConfig;
use crate::drivers::face::FaceRenderer;
use crate::error::{AbortCause, CommandError};
use crate::expression::ExpressionStateMachine;
use crate::routine::{Advance, Routine, StepPlan};
use crate::safety::{LatchTransition, SafetyMonitor};
use crate::scheduler::{Scheduler, TimedAction};
use crate::sensors::SensorSampler;
use crate::state::{Motion, RobotState, SafetyReason};

use super::events::{AUTO_STOP_ID, OutboundEvent, SensorTelemetry, StatusSnapshot};
use super::ports::{ActuatorPort, DisplayPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// RobotService
// ───────────────────────────────────────────────────────────────

pub struct RobotService {
    pub(super) config: RobotConfig,
    pub(super) state: RobotState,
    sampler: SensorSampler,
    safety: SafetyMonitor,
    expression: ExpressionStateMachine,
    pub(super) scheduler: Scheduler,
    pub(super) routine: Option<Routine>,
    renderer: FaceRenderer,
    last_sample_at: Option<u64>,
}

impl RobotService {
    /// Construct the service.  Does **not** touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(config: RobotConfig) -> Self {
        let state = RobotState::new(&config);
        Self {
            sampler: SensorSampler::new(&config),
            safety: SafetyMonitor::new(),
            expression: ExpressionStateMachine::new(&config),
            scheduler: Scheduler::new(),
            routine: None,
            renderer: FaceRenderer::new(),
            last_sample_at: None,
            state,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put every actuator in its safe state and arm the blink timer.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, now_ms: u64) {
        hw.apply_motion(Motion::Stopped);
        hw.set_buzzer(false);
        self.state.motion = Motion::Stopped;
        self.state.buzzer_on = false;
        self.expression.init(&mut self.state, now_ms);
        self.renderer.invalidate();
        info!(
            "RobotService started (sample every {}ms, danger<{}cm, smoke>{}%)",
            self.config.sensor_interval_ms,
            self.state.thresholds().danger_distance_cm,
            self.state.thresholds().smoke_sensitivity_pct,
        );
    }

    /// A websocket client connected: send it the current state.
    pub fn connected(&mut self, sink: &mut impl EventSink, now_ms: u64) {
        info!("client connected");
        self.emit_status(sink, now_ms);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn routine(&self) -> Option<&Routine> {
        self.routine.as_ref()
    }

    pub fn is_pending(&self, action: TimedAction) -> bool {
        self.scheduler.is_pending(action)
    }

    pub fn status(&self, now_ms: u64) -> StatusSnapshot {
        StatusSnapshot::capture(&self.state, now_ms)
    }

    pub fn telemetry(&self, now_ms: u64) -> SensorTelemetry {
        SensorTelemetry::capture(&self.state, now_ms)
    }

    // ── Sampling & safety ─────────────────────────────────────

    /// Whether a sensor period has elapsed since the last sample.
    pub fn sample_due(&self, now_ms: u64) -> bool {
        self.last_sample_at.is_none_or(|at| {
            now_ms.saturating_sub(at) >= u64::from(self.config.sensor_interval_ms)
        })
    }

    /// Sample every enabled sensor, run the safety monitor, publish
    /// `sensor_data`.
    pub fn sample_and_evaluate(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        self.take_sample(hw, now_ms);
        self.evaluate_safety(hw, sink, now_ms);
        sink.emit(&OutboundEvent::SensorData(self.telemetry(now_ms)));
    }

    fn take_sample(&mut self, hw: &mut impl SensorPort, now_ms: u64) {
        self.state.last_sample = self.sampler.sample(hw, self.state.sensors_enabled);
        self.last_sample_at = Some(now_ms);
    }

    /// Re-evaluate the latch against the last sample and apply any edge.
    pub(super) fn evaluate_safety(
        &mut self,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        let decision = self.safety.evaluate(&self.state.last_sample, &self.state);
        let transition = self.safety.transition(self.state.safety, decision);
        self.state.safety = decision.latch();

        match transition {
            LatchTransition::Armed(reason) => self.emergency_stop(reason, hw, sink, now_ms),
            LatchTransition::Cleared => {
                ExpressionStateMachine::resolve(&mut self.state);
                self.emit_status(sink, now_ms);
            }
            LatchTransition::Held | LatchTransition::Idle => {}
        }
    }

    fn emergency_stop(
        &mut self,
        reason: SafetyReason,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        hw.apply_motion(Motion::Stopped);
        self.state.motion = Motion::Stopped;
        self.state.blink.is_blinking = false;
        ExpressionStateMachine::resolve(&mut self.state);
        self.scheduler.cancel(TimedAction::StopMotion);
        self.abort_routine(AbortCause::Safety(reason), sink);

        let message = match reason {
            SafetyReason::ObstacleTooClose => "Emergency stop - obstacle too close",
            SafetyReason::SmokeDetected => "Emergency stop - smoke detected",
        };
        sink.emit(&OutboundEvent::ack(AUTO_STOP_ID, message));
        self.emit_status(sink, now_ms);
    }

    // ── Deadlines ─────────────────────────────────────────────

    /// Fire every deadline due at `now_ms`.
    pub fn run_deadlines(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        while let Some(action) = self.scheduler.pop_due(now_ms) {
            match action {
                TimedAction::StopMotion => {
                    info!("timed move elapsed, stopping");
                    self.drive(hw, Motion::Stopped);
                    self.emit_status(sink, now_ms);
                }
                TimedAction::BuzzerOff => {
                    hw.set_buzzer(false);
                    self.state.buzzer_on = false;
                    self.emit_status(sink, now_ms);
                }
                TimedAction::RoutineStep => self.advance_routine(hw, sink, now_ms),
            }
        }
    }

    // ── Routines ──────────────────────────────────────────────

    fn advance_routine(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        if self.routine.is_none() {
            warn!("routine step fired with no routine running");
            return;
        }

        // Step boundaries sample fresh: patrol evades on it, scan shows it.
        self.take_sample(hw, now_ms);
        self.evaluate_safety(hw, sink, now_ms);

        let sample = self.state.last_sample;
        let Some(routine) = self.routine.as_mut() else {
            // The latch armed on that sample and aborted the routine.
            return;
        };
        match routine.advance(&sample, &self.config) {
            Advance::Continue(plan) => self.apply_plan(hw, plan, now_ms),
            Advance::Finished { plan, message } => {
                let id = routine.command_id().to_owned();
                self.routine = None;
                self.apply_plan(hw, plan, now_ms);
                info!("routine {id} completed");
                sink.emit(&OutboundEvent::ack(&id, message));
            }
        }
        self.emit_status(sink, now_ms);
    }

    /// Apply one routine step and arm the deadline for the next.
    pub(super) fn apply_plan(&mut self, hw: &mut impl ActuatorPort, plan: StepPlan, now_ms: u64) {
        let motion = Motion::for_direction(plan.direction, &self.config);
        self.drive(hw, motion);
        if let Some(expression) = plan.expression {
            self.state.requested_expression = expression;
            ExpressionStateMachine::resolve(&mut self.state);
        }
        if let Some(text) = plan.text {
            self.state.display_text = text;
        }
        if plan.hold_ms > 0 {
            self.scheduler
                .schedule(TimedAction::RoutineStep, now_ms + u64::from(plan.hold_ms));
        }
    }

    /// Stop a running routine and report it to its originator.
    pub(super) fn abort_routine(&mut self, cause: AbortCause, sink: &mut impl EventSink) {
        let Some(routine) = self.routine.take() else {
            return;
        };
        self.scheduler.cancel(TimedAction::RoutineStep);
        let err = CommandError::Aborted {
            action: routine.kind().action(),
            cause,
        };
        warn!("routine {}: {err}", routine.command_id());
        sink.emit(&OutboundEvent::error(routine.command_id(), err));
    }

    // ── Face ──────────────────────────────────────────────────

    /// Advance the blink timer and redraw the face if it changed.
    pub fn tick_face(&mut self, display: &mut impl DisplayPort, now_ms: u64) {
        self.expression.tick(&mut self.state, now_ms);
        self.renderer.refresh(&self.state, display);
    }

    // ── Helpers ───────────────────────────────────────────────

    pub(super) fn drive(&mut self, hw: &mut impl ActuatorPort, motion: Motion) {
        hw.apply_motion(motion);
        self.state.motion = motion;
    }

    pub(super) fn emit_status(&self, sink: &mut impl EventSink, now_ms: u64) {
        sink.emit(&OutboundEvent::StatusUpdate(self.status(now_ms)));
    }
}
