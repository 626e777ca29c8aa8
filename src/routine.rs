//! Autonomous routines as step machines.
//!
//! A routine never blocks: each step returns a [`StepPlan`] (motion,
//! optional face change, hold time) and the service arms a
//! [`TimedAction::RoutineStep`](crate::scheduler::TimedAction::RoutineStep)
//! deadline for the hold.  When the deadline fires the service takes a
//! fresh sensor sample and calls [`Routine::advance`].
//!
//! ```text
//! patrol:  Advance ──(obstacle < evade)──▶ Backoff ─▶ EvadeTurn ─┐
//!             └────────────(clear)──────────────────────────────┴▶ Turn ─▶ Return ─▶ done
//! scan:    Rotate ─▶ Hold(reading on display) ─▶ done
//! ```

use core::fmt::Write as _;

use crate::app::events::CommandId;
use crate::config::RobotConfig;
use crate::state::{Direction, DisplayText, Expression, Reading, SensorSample, bounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Patrol,
    Scan,
}

impl RoutineKind {
    pub fn action(self) -> &'static str {
        match self {
            Self::Patrol => "patrol",
            Self::Scan => "scan",
        }
    }

    fn completion_message(self) -> &'static str {
        match self {
            Self::Patrol => "Patrol completed",
            Self::Scan => "Scan completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PatrolAdvance,
    PatrolBackoff,
    PatrolEvadeTurn,
    PatrolTurn,
    PatrolReturn,
    ScanRotate,
    ScanHold,
}

/// Effects of one routine step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    pub direction: Direction,
    pub expression: Option<Expression>,
    pub text: Option<DisplayText>,
    /// How long to hold this step before advancing.
    pub hold_ms: u32,
}

impl StepPlan {
    fn drive(direction: Direction, hold_ms: u32) -> Self {
        Self {
            direction,
            expression: None,
            text: None,
            hold_ms,
        }
    }

    fn with_face(mut self, expression: Expression, text: &str) -> Self {
        self.expression = Some(expression);
        self.text = Some(DisplayText::new(text));
        self
    }
}

/// Result of advancing a routine past a step boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Continue(StepPlan),
    /// Routine is over; apply the final plan and acknowledge.
    Finished {
        plan: StepPlan,
        message: &'static str,
    },
}

/// A running routine and the command that started it.
#[derive(Debug, Clone)]
pub struct Routine {
    kind: RoutineKind,
    command_id: CommandId,
    phase: Phase,
}

impl Routine {
    /// Start `kind` on behalf of command `command_id`.
    pub fn start(kind: RoutineKind, command_id: &str, config: &RobotConfig) -> (Self, StepPlan) {
        let (phase, plan) = match kind {
            RoutineKind::Patrol => (
                Phase::PatrolAdvance,
                StepPlan::drive(Direction::Forward, config.patrol_advance_ms)
                    .with_face(Expression::Thinking, "Patrolling..."),
            ),
            RoutineKind::Scan => (
                Phase::ScanRotate,
                StepPlan::drive(Direction::Right, config.scan_rotate_ms)
                    .with_face(Expression::Thinking, "Scanning..."),
            ),
        };
        let routine = Self {
            kind,
            command_id: bounded(command_id),
            phase,
        };
        (routine, plan)
    }

    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    pub fn command_id(&self) -> &str {
        self.command_id.as_str()
    }

    /// Move past the current step using a sample taken at the boundary.
    pub fn advance(&mut self, sample: &SensorSample, config: &RobotConfig) -> Advance {
        let (next, plan) = match self.phase {
            Phase::PatrolAdvance => {
                let blocked = sample
                    .distance_cm
                    .value()
                    .is_some_and(|d| d < config.patrol_evade_distance_cm);
                if blocked {
                    (
                        Phase::PatrolBackoff,
                        StepPlan::drive(Direction::Backward, config.patrol_backoff_ms),
                    )
                } else {
                    (
                        Phase::PatrolTurn,
                        StepPlan::drive(Direction::Right, config.patrol_turn_ms),
                    )
                }
            }
            Phase::PatrolBackoff => (
                Phase::PatrolEvadeTurn,
                StepPlan::drive(Direction::Right, config.patrol_evade_turn_ms),
            ),
            Phase::PatrolEvadeTurn => (
                Phase::PatrolTurn,
                StepPlan::drive(Direction::Right, config.patrol_turn_ms),
            ),
            Phase::PatrolTurn => (
                Phase::PatrolReturn,
                StepPlan::drive(Direction::Forward, config.patrol_return_ms),
            ),
            Phase::ScanRotate => {
                let mut plan = StepPlan::drive(Direction::Stop, config.scan_hold_ms);
                plan.text = Some(scan_readout(sample));
                (Phase::ScanHold, plan)
            }
            Phase::PatrolReturn => {
                return Advance::Finished {
                    plan: StepPlan::drive(Direction::Stop, 0)
                        .with_face(Expression::Happy, "Patrol done!"),
                    message: self.kind.completion_message(),
                };
            }
            Phase::ScanHold => {
                return Advance::Finished {
                    plan: StepPlan::drive(Direction::Stop, 0)
                        .with_face(Expression::Neutral, "Scan complete"),
                    message: self.kind.completion_message(),
                };
            }
        };
        self.phase = next;
        Advance::Continue(plan)
    }
}

/// `D:<cm> S:<pct>` with `--` for no echo and `off` for disabled sensors.
fn scan_readout(sample: &SensorSample) -> DisplayText {
    let mut line = heapless::String::<32>::new();
    let _ = write!(line, "D:");
    push_reading(&mut line, sample.distance_cm);
    let _ = write!(line, " S:");
    push_reading(&mut line, sample.smoke_pct);
    DisplayText::new(&line)
}

fn push_reading(line: &mut heapless::String<32>, reading: Reading) {
    let _ = match reading {
        Reading::Valid(v) => write!(line, "{v:.1}"),
        Reading::Unavailable => write!(line, "--"),
        Reading::Disabled => write!(line, "off"),
    };
}
