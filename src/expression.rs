//! Face expression state machine.
//!
//! Each loop iteration resolves what the face shows, by priority:
//!
//! ```text
//!   safety latch armed ──▶ Surprised (no blinking)
//!   blink pulse active ──▶ eyes-closed overlay on the requested expression
//!   otherwise          ──▶ requested expression
//! ```
//!
//! Blinks are pulses of `blink_pulse_ms`, spaced by a uniformly random
//! interval in `[blink_min_interval_ms, blink_max_interval_ms]`.

use nanorand::{Rng, WyRand};

use crate::config::RobotConfig;
use crate::state::{BlinkState, Expression, RobotState};

pub struct ExpressionStateMachine {
    rng: WyRand,
    pulse_ms: u64,
    min_interval_ms: u64,
    max_interval_ms: u64,
}

impl ExpressionStateMachine {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            rng: WyRand::new_seed(config.rng_seed),
            pulse_ms: u64::from(config.blink_pulse_ms),
            min_interval_ms: u64::from(config.blink_min_interval_ms),
            max_interval_ms: u64::from(config.blink_max_interval_ms),
        }
    }

    /// Schedule the first blink and resolve the initial face.
    pub fn init(&mut self, state: &mut RobotState, now_ms: u64) {
        state.blink = BlinkState {
            is_blinking: false,
            next_blink_due_at: now_ms + self.next_interval(),
            blink_ends_at: now_ms,
        };
        Self::resolve(state);
    }

    /// Advance the blink timer and re-resolve the effective expression.
    pub fn tick(&mut self, state: &mut RobotState, now_ms: u64) {
        let blink = &mut state.blink;
        if state.safety.armed {
            blink.is_blinking = false;
            // Push the due time along so clearing the latch doesn't blink at once.
            if now_ms >= blink.next_blink_due_at {
                blink.next_blink_due_at = now_ms + self.min_interval_ms;
            }
        } else {
            if blink.is_blinking && now_ms >= blink.blink_ends_at {
                blink.is_blinking = false;
            }
            if !blink.is_blinking && now_ms >= blink.next_blink_due_at {
                blink.is_blinking = true;
                blink.blink_ends_at = now_ms + self.pulse_ms;
                blink.next_blink_due_at = now_ms + self.next_interval();
            }
        }
        Self::resolve(state);
    }

    /// Apply the safety override to `effective_expression`.
    pub fn resolve(state: &mut RobotState) {
        state.effective_expression = if state.safety.armed {
            Expression::Surprised
        } else {
            state.requested_expression
        };
    }

    fn next_interval(&mut self) -> u64 {
        self.rng
            .generate_range(self.min_interval_ms..=self.max_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SafetyLatch, SafetyReason};

    fn setup() -> (ExpressionStateMachine, RobotState) {
        let config = RobotConfig::default();
        (ExpressionStateMachine::new(&config), RobotState::new(&config))
    }

    #[test]
    fn first_blink_lands_in_window() {
        let (mut esm, mut state) = setup();
        esm.init(&mut state, 1_000);
        let due = state.blink.next_blink_due_at;
        assert!((4_000..=6_000).contains(&due), "due {due}");
        assert!(!state.blink.is_blinking);
    }

    #[test]
    fn blink_pulse_lasts_150ms() {
        let (mut esm, mut state) = setup();
        esm.init(&mut state, 0);
        let due = state.blink.next_blink_due_at;

        esm.tick(&mut state, due - 1);
        assert!(!state.blink.is_blinking);

        esm.tick(&mut state, due);
        assert!(state.blink.is_blinking);
        assert_eq!(state.blink.blink_ends_at, due + 150);
        let next = state.blink.next_blink_due_at;
        assert!((due + 3_000..=due + 5_000).contains(&next));

        esm.tick(&mut state, due + 149);
        assert!(state.blink.is_blinking);
        esm.tick(&mut state, due + 150);
        assert!(!state.blink.is_blinking);
    }

    #[test]
    fn blink_keeps_requested_expression_underneath() {
        let (mut esm, mut state) = setup();
        state.requested_expression = Expression::Happy;
        esm.init(&mut state, 0);
        let due = state.blink.next_blink_due_at;
        esm.tick(&mut state, due);
        assert!(state.blink.is_blinking);
        assert_eq!(state.effective_expression, Expression::Happy);
    }

    #[test]
    fn armed_latch_forces_surprised_and_cancels_blink() {
        let (mut esm, mut state) = setup();
        state.requested_expression = Expression::Sad;
        esm.init(&mut state, 0);
        let due = state.blink.next_blink_due_at;
        esm.tick(&mut state, due);
        assert!(state.blink.is_blinking);

        state.safety = SafetyLatch {
            armed: true,
            reason: Some(SafetyReason::SmokeDetected),
        };
        esm.tick(&mut state, due + 10);
        assert!(!state.blink.is_blinking);
        assert_eq!(state.effective_expression, Expression::Surprised);

        esm.tick(&mut state, due + 20_000);
        assert!(!state.blink.is_blinking);

        state.safety = SafetyLatch::default();
        esm.tick(&mut state, due + 20_010);
        assert_eq!(state.effective_expression, Expression::Sad);
        assert!(!state.blink.is_blinking);
    }

    #[test]
    fn same_seed_same_schedule() {
        let (mut a, mut sa) = setup();
        let (mut b, mut sb) = setup();
        a.init(&mut sa, 0);
        b.init(&mut sb, 0);
        assert_eq!(sa.blink, sb.blink);
    }
}
