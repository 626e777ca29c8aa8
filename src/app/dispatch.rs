//! Command dispatcher.
//!
//! Every command that reaches [`RobotService::dispatch`] produces exactly
//! one correlated outcome followed by a `status_update`:
//!
//! - immediate commands answer with `command_ack` or `error` right away;
//! - routines (`patrol`, `scan`) answer when they complete, or with an
//!   `error` if the safety latch or a later motion command cuts them short.
//!
//! Synchronous API requests reuse the same execution path but answer over
//! HTTP instead of the websocket.

use log::{debug, info, warn};

use crate::error::{AbortCause, CommandError, token};
use crate::expression::ExpressionStateMachine;
use crate::protocol::api::{ApiRequest, ApiResponse};
use crate::protocol::envelope::{self, RawCommand, SensorData, StatusData};
use crate::routine::{Routine, RoutineKind};
use crate::scheduler::TimedAction;
use crate::state::{Direction, Motion, Reading, SafetyReason, SensorKind};

use super::commands::{RobotCommand, parse_switch};
use super::events::{Message, OutboundEvent, message};
use super::ports::{ActuatorPort, EventSink, SensorPort};
use super::service::RobotService;

/// Correlation id used in logs for commands arriving over HTTP.
const API_ID: &str = "api";

/// Immediate result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Applied; acknowledge with this message.
    Done(Message),
    /// A routine took over; it acknowledges on completion.
    Started,
}

impl RobotService {
    // ── Websocket path ────────────────────────────────────────

    /// Decode one inbound frame and dispatch it.  Undecodable frames are
    /// dropped without a reply.
    pub fn handle_frame(
        &mut self,
        bytes: &[u8],
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        match envelope::decode(bytes) {
            Ok(raw) => self.dispatch(&raw, hw, sink, now_ms),
            Err(e) => debug!("ws: dropping frame: {e}"),
        }
    }

    /// Validate and execute one command envelope.
    pub fn dispatch(
        &mut self,
        raw: &RawCommand,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) {
        let id = raw.id.as_str();
        let result = RobotCommand::parse(&raw.data)
            .and_then(|cmd| self.execute(id, cmd, hw, sink, now_ms));

        match result {
            Ok(Outcome::Done(msg)) => {
                info!("cmd {id}: {msg}");
                sink.emit(&OutboundEvent::ack(id, msg));
            }
            Ok(Outcome::Started) => info!("cmd {id}: routine started"),
            Err(e) => {
                warn!("cmd {id} rejected: {e}");
                sink.emit(&OutboundEvent::error(id, e));
            }
        }
        self.emit_status(sink, now_ms);
    }

    // ── Execution ─────────────────────────────────────────────

    /// Apply a validated command.  On error the robot state is unchanged.
    pub fn execute(
        &mut self,
        id: &str,
        cmd: RobotCommand,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Result<Outcome, CommandError> {
        self.check_lockout(&cmd)?;

        match cmd {
            RobotCommand::Move {
                direction,
                duration_ms,
            } => {
                self.abort_routine(AbortCause::Superseded("move"), sink);
                self.scheduler.cancel(TimedAction::StopMotion);
                let motion = Motion::for_direction(direction, &self.config);
                self.drive(hw, motion);
                if let Some(ms) = duration_ms.filter(|ms| *ms > 0 && motion.is_moving()) {
                    self.scheduler
                        .schedule(TimedAction::StopMotion, now_ms + u64::from(ms));
                }
                Ok(done("Movement command executed"))
            }

            RobotCommand::Buzzer { on, duration_ms } => {
                hw.set_buzzer(on);
                self.state.buzzer_on = on;
                self.scheduler.cancel(TimedAction::BuzzerOff);
                if let Some(ms) = duration_ms.filter(|ms| on && *ms > 0) {
                    self.scheduler
                        .schedule(TimedAction::BuzzerOff, now_ms + u64::from(ms));
                }
                Ok(done(if on { "Buzzer ON" } else { "Buzzer OFF" }))
            }

            RobotCommand::Oled { text } => {
                self.state.display_text = text;
                Ok(done("OLED updated"))
            }

            RobotCommand::Expression(expression) => {
                self.state.requested_expression = expression;
                ExpressionStateMachine::resolve(&mut self.state);
                Ok(Outcome::Done(message(format_args!(
                    "Expression changed to {}",
                    expression.as_str()
                ))))
            }

            RobotCommand::SensorToggle { sensor, enabled } => {
                if self.state.sensors_enabled.is_enabled(sensor) != enabled {
                    self.state.sensors_enabled.set(sensor, enabled);
                    // Not sampled yet, or switched off.
                    let reading = if enabled {
                        Reading::Unavailable
                    } else {
                        Reading::Disabled
                    };
                    match sensor {
                        SensorKind::Ultrasonic => self.state.last_sample.distance_cm = reading,
                        SensorKind::Smoke => self.state.last_sample.smoke_pct = reading,
                    }
                }
                if !enabled && self.state.safety.armed {
                    self.evaluate_safety(hw, sink, now_ms);
                }
                Ok(Outcome::Done(message(format_args!(
                    "{} sensor {}",
                    sensor.label(),
                    if enabled { "enabled" } else { "disabled" }
                ))))
            }

            RobotCommand::SetThresholds(patch) => {
                let merged = patch.apply_to(self.state.thresholds());
                self.state.replace_thresholds(merged)?;
                info!(
                    "thresholds: warning={}cm danger={}cm smoke={}%",
                    merged.warning_distance_cm,
                    merged.danger_distance_cm,
                    merged.smoke_sensitivity_pct
                );
                Ok(done("Thresholds updated"))
            }

            RobotCommand::Patrol => Ok(self.start_routine(RoutineKind::Patrol, id, hw, sink, now_ms)),
            RobotCommand::Scan => Ok(self.start_routine(RoutineKind::Scan, id, hw, sink, now_ms)),
        }
    }

    /// Motion other than `stop` is refused while the latch is armed.
    fn check_lockout(&self, cmd: &RobotCommand) -> Result<(), CommandError> {
        let stopping = matches!(
            cmd,
            RobotCommand::Move {
                direction: Direction::Stop,
                ..
            }
        );
        if self.state.safety.armed && cmd.drives_wheels() && !stopping {
            return Err(CommandError::SafetyLockout {
                action: cmd.action(),
                reason: self
                    .state
                    .safety
                    .reason
                    .unwrap_or(SafetyReason::ObstacleTooClose),
            });
        }
        Ok(())
    }

    fn start_routine(
        &mut self,
        kind: RoutineKind,
        id: &str,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Outcome {
        self.abort_routine(AbortCause::Superseded(kind.action()), sink);
        self.scheduler.cancel(TimedAction::StopMotion);
        let (routine, plan) = Routine::start(kind, id, &self.config);
        self.apply_plan(hw, plan, now_ms);
        self.routine = Some(routine);
        Outcome::Started
    }

    // ── Synchronous API path ──────────────────────────────────

    /// Execute one API request and build its reply.  Successful mutating
    /// requests also broadcast a `status_update`.
    pub fn handle_api(
        &mut self,
        request: ApiRequest,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> ApiResponse {
        match request {
            ApiRequest::Status => ApiResponse::ok(&StatusData::from(&self.status(now_ms))),
            ApiRequest::Sensor => ApiResponse::ok(&SensorData::from(&self.telemetry(now_ms))),

            ApiRequest::Buzzer { state: None } => ApiResponse::missing("state"),
            ApiRequest::Buzzer { state: Some(raw) } => match parse_switch(&raw) {
                Some(on) => self.api_command(
                    RobotCommand::Buzzer {
                        on,
                        duration_ms: None,
                    },
                    hw,
                    sink,
                    now_ms,
                ),
                None => bad_request(&CommandError::InvalidParameter {
                    action: "buzzer",
                    param: "state",
                }),
            },

            ApiRequest::Oled { text: None } => ApiResponse::missing("text"),
            ApiRequest::Oled { text: Some(text) } => {
                self.api_command(RobotCommand::Oled { text }, hw, sink, now_ms)
            }

            ApiRequest::Move {
                direction: None, ..
            } => ApiResponse::missing("direction"),
            ApiRequest::Move {
                direction: Some(raw),
                duration,
            } => {
                let Some(direction) = Direction::parse(&raw) else {
                    return bad_request(&CommandError::UnknownDirection(token(&raw)));
                };
                let duration_ms = match duration {
                    None => Some(self.config.rest_move_duration_ms),
                    Some(ms) => match ms.parse::<u32>() {
                        Ok(ms) => Some(ms),
                        Err(_) => {
                            return bad_request(&CommandError::InvalidParameter {
                                action: "move",
                                param: "duration",
                            });
                        }
                    },
                };
                self.api_command(
                    RobotCommand::Move {
                        direction,
                        duration_ms,
                    },
                    hw,
                    sink,
                    now_ms,
                )
            }

            ApiRequest::NotFound(path) => {
                debug!("api: no route for {path}");
                ApiResponse::not_found()
            }
        }
    }

    fn api_command(
        &mut self,
        cmd: RobotCommand,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> ApiResponse {
        match self.execute(API_ID, cmd, hw, sink, now_ms) {
            Ok(outcome) => {
                self.emit_status(sink, now_ms);
                match outcome {
                    Outcome::Done(msg) => ApiResponse::message(&msg),
                    Outcome::Started => ApiResponse::message("Started"),
                }
            }
            Err(e @ CommandError::SafetyLockout { .. }) => {
                warn!("api: {e}");
                ApiResponse::error(ApiResponse::CONFLICT, &e.to_string())
            }
            Err(e) => bad_request(&e),
        }
    }
}

fn done(text: &str) -> Outcome {
    Outcome::Done(message(text))
}

fn bad_request(e: &CommandError) -> ApiResponse {
    ApiResponse::error(ApiResponse::BAD_REQUEST, &e.to_string())
}
