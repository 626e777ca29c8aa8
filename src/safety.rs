//! Safety monitor.
//!
//! Runs on the sampling cadence, right after every fresh sensor sample,
//! and decides whether the emergency-stop latch should be armed.
//!
//! ## Latch lifecycle
//!
//! 1. A condition holds (obstacle inside the danger distance while the
//!    robot moves, or smoke above the sensitivity).
//! 2. The monitor reports `armed`; the service stops the wheels, forces
//!    the face to `Surprised` and emits the `auto_stop` acknowledgement.
//! 3. While armed, each sample is re-evaluated.  The obstacle condition
//!    drops its "moving" clause because the latch itself stopped the robot.
//! 4. The first sample where no condition holds clears the latch.
//!
//! Commands never clear the latch.  Disabling a sensor re-evaluates it
//! with the new enables, which may clear it.

use log::{error, info};

use crate::state::{Reading, RobotState, SafetyLatch, SafetyReason, SensorSample};

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyDecision {
    pub armed: bool,
    pub reason: Option<SafetyReason>,
}

impl SafetyDecision {
    const CLEAR: Self = Self {
        armed: false,
        reason: None,
    };

    fn armed(reason: SafetyReason) -> Self {
        Self {
            armed: true,
            reason: Some(reason),
        }
    }

    pub fn latch(self) -> SafetyLatch {
        SafetyLatch {
            armed: self.armed,
            reason: self.reason,
        }
    }
}

/// Edge between the current latch and a new decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchTransition {
    Armed(SafetyReason),
    /// Still armed, possibly for a different reason.
    Held,
    Cleared,
    Idle,
}

/// Stateless evaluator; the latch itself lives in [`RobotState::safety`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyMonitor;

impl SafetyMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `sample` against the thresholds, enables and motion in
    /// `state`.  Obstacle wins over smoke when both hold.
    pub fn evaluate(&self, sample: &SensorSample, state: &RobotState) -> SafetyDecision {
        let thresholds = state.thresholds();
        let holding = state.safety.armed;

        let too_close = state.sensors_enabled.ultrasonic
            && matches!(sample.distance_cm, Reading::Valid(d) if d < thresholds.danger_distance_cm)
            && (holding || state.motion.is_moving());
        if too_close {
            return SafetyDecision::armed(SafetyReason::ObstacleTooClose);
        }

        let smoky = state.sensors_enabled.smoke
            && matches!(sample.smoke_pct, Reading::Valid(s) if s > thresholds.smoke_sensitivity_pct);
        if smoky {
            return SafetyDecision::armed(SafetyReason::SmokeDetected);
        }

        SafetyDecision::CLEAR
    }

    /// Classify the change from `current` to `decision`, logging edges.
    pub fn transition(&self, current: SafetyLatch, decision: SafetyDecision) -> LatchTransition {
        match (current.armed, decision.armed, decision.reason) {
            (false, true, Some(reason)) => {
                error!("SAFETY LATCH ARMED: {reason}");
                LatchTransition::Armed(reason)
            }
            (true, true, _) => LatchTransition::Held,
            (true, false, _) => {
                info!("SAFETY LATCH CLEARED");
                LatchTransition::Cleared
            }
            _ => LatchTransition::Idle,
        }
    }
}
