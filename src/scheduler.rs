//! Deadline scheduler.
//!
//! Every timed behaviour in the controller (timed moves, timed beeps,
//! routine steps) is a deadline on the control loop's own clock.  The loop
//! pops due deadlines each iteration; nothing ever sleeps.
//!
//! ```text
//!  dispatch(move, 1000ms) ──▶ schedule(StopMotion, now+1000)
//!                                     │
//!  iterate(now) ──▶ pop_due(now) ─────┘──▶ apply_motion(Stopped)
//! ```

use log::{debug, warn};

// ═══════════════════════════════════════════════════════════════
//  Deadline types
// ═══════════════════════════════════════════════════════════════

/// What to do when a deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    /// End a timed `move`.
    StopMotion,
    /// End a timed buzzer beep.
    BuzzerOff,
    /// Advance the active routine to its next step.
    RoutineStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub due_at: u64,
    pub action: TimedAction,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of pending deadlines (stack-allocated).
const MAX_DEADLINES: usize = 8;

/// Sorted list of pending deadlines, earliest first.
///
/// At most one deadline per [`TimedAction`] is pending; scheduling an
/// action again replaces the earlier deadline.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: heapless::Vec<Deadline, MAX_DEADLINES>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `action` to fire at `due_at` (milliseconds, loop clock).
    pub fn schedule(&mut self, action: TimedAction, due_at: u64) {
        self.cancel(action);
        if self.pending.push(Deadline { due_at, action }).is_err() {
            warn!("Scheduler: full, dropping {:?}", action);
            return;
        }
        self.pending.sort_unstable_by_key(|d| d.due_at);
        debug!("Scheduler: {:?} due at {}ms", action, due_at);
    }

    /// Drop any pending deadline for `action`.
    pub fn cancel(&mut self, action: TimedAction) {
        self.pending.retain(|d| d.action != action);
    }

    /// Pop the earliest deadline if it is due at `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<TimedAction> {
        match self.pending.first() {
            Some(d) if d.due_at <= now => Some(self.pending.remove(0).action),
            _ => None,
        }
    }

    pub fn is_pending(&self, action: TimedAction) -> bool {
        self.pending.iter().any(|d| d.action == action)
    }
}

#[cfg(test)]
impl Scheduler {
    fn next_due(&self) -> Option<u64> {
        self.pending.first().map(|d| d.due_at)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
