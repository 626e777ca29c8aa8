//! Safety latch end to end: sensor readings arm and clear the latch, the
//! latch overrides motion and the face, and commands respect it.

use emubot::app::events::OutboundEvent;
use emubot::drivers::face::Glyph;
use emubot::scheduler::TimedAction;
use emubot::state::{Expression, Motion, SafetyReason};
use serde_json::json;

use crate::mock_hw::Rig;

fn auto_stop_acks(rig: &Rig) -> Vec<String> {
    rig.sink
        .events
        .iter()
        .filter_map(|e| match e {
            OutboundEvent::CommandAck {
                command_id,
                message,
            } if command_id.as_str() == "auto_stop" => Some(message.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn obstacle_while_moving_forces_stop() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(80.0);
    rig.command("go", json!({"action": "move", "direction": "forward"}));
    assert!(rig.motion().is_moving());

    rig.hw.set_distance_cm(5.0);
    rig.run_until(500);

    assert!(rig.armed());
    assert_eq!(rig.motion(), Motion::Stopped);
    assert_eq!(rig.hw.motion(), Motion::Stopped);
    assert_eq!(
        rig.control.service().state().effective_expression,
        Expression::Surprised
    );
    assert_eq!(
        auto_stop_acks(&rig),
        ["Emergency stop - obstacle too close"]
    );
}

#[test]
fn obstacle_while_idle_does_not_arm() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(5.0);
    rig.run_until(1_000);
    assert!(!rig.armed());
    assert!(auto_stop_acks(&rig).is_empty());
}

#[test]
fn latch_reports_once_and_clears_when_path_opens() {
    let mut rig = Rig::new();
    rig.command("go", json!({"action": "move", "direction": "forward"}));
    rig.hw.set_distance_cm(5.0);
    rig.run_until(2_000);

    // Held across samples, reported once.
    assert!(rig.armed());
    assert_eq!(auto_stop_acks(&rig).len(), 1);

    rig.hw.set_distance_cm(60.0);
    rig.run_until(2_500);
    assert!(!rig.armed());
    let state = rig.control.service().state();
    assert_eq!(state.safety.reason, None);
    assert_eq!(state.effective_expression, state.requested_expression);
    // Clearing never restarts motion.
    assert_eq!(rig.motion(), Motion::Stopped);
}

#[test]
fn motion_is_refused_while_armed_but_stop_is_accepted() {
    let mut rig = Rig::new();
    rig.command("go", json!({"action": "move", "direction": "forward"}));
    rig.hw.set_distance_cm(3.0);
    rig.run_until(500);
    assert!(rig.armed());

    rig.command("fwd", json!({"action": "move", "direction": "forward"}));
    assert_eq!(rig.sink.errors_for("fwd"), 1);
    assert_eq!(
        rig.sink.last_message_for("fwd").as_deref(),
        Some("move: blocked by emergency stop (obstacle too close)")
    );
    assert_eq!(rig.hw.motion(), Motion::Stopped);

    rig.command("halt", json!({"action": "move", "direction": "stop"}));
    assert_eq!(rig.sink.acks_for("halt"), 1);

    rig.command("p", json!({"action": "patrol"}));
    assert_eq!(rig.sink.errors_for("p"), 1);
    assert!(rig.control.service().routine().is_none());
}

#[test]
fn disabling_the_ranger_releases_an_obstacle_latch() {
    let mut rig = Rig::new();
    rig.command("go", json!({"action": "move", "direction": "backward"}));
    rig.hw.set_distance_cm(4.0);
    rig.run_until(500);
    assert!(rig.armed());

    rig.command(
        "off",
        json!({"action": "sensor_toggle", "sensor": "ultrasonic", "enabled": false}),
    );
    assert!(!rig.armed());
    assert_eq!(rig.sink.acks_for("off"), 1);
}

#[test]
fn tighter_danger_threshold_applies_on_next_sample() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(12.0);
    rig.command("go", json!({"action": "move", "direction": "forward"}));
    rig.run_until(500);
    assert!(!rig.armed());

    rig.command(
        "t",
        json!({"action": "set_thresholds", "thresholds": {"ultrasonicDanger": 20, "ultrasonicWarning": 40}}),
    );
    rig.run_until(1_000);
    assert!(rig.armed());
}

#[test]
fn face_shows_surprise_and_never_blinks_while_armed() {
    let mut rig = Rig::new();
    rig.command("go", json!({"action": "move", "direction": "forward"}));
    rig.hw.set_distance_cm(2.0);
    rig.run_until(500);
    let drawn = rig.display.frames.len();

    // Long enough for several blink periods.
    rig.run_until(20_000);
    assert!(rig.armed());
    assert!(
        rig.display.frames[drawn..]
            .iter()
            .all(|f| f.glyph == Glyph::Expression(Expression::Surprised))
    );
    assert_eq!(
        rig.display.frames.last().map(|f| f.glyph),
        Some(Glyph::Expression(Expression::Surprised))
    );
}

#[test]
fn smoke_arms_even_when_stationary() {
    let mut rig = Rig::new();
    rig.hw.smoke_raw = Some(3_000); // ~73 %
    rig.run_until(500);

    assert!(rig.armed());
    assert_eq!(
        rig.control.service().state().safety.reason,
        Some(SafetyReason::SmokeDetected)
    );
    assert_eq!(auto_stop_acks(&rig), ["Emergency stop - smoke detected"]);
}

#[test]
fn timed_move_keeps_sampling_and_latches_before_its_deadline() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(80.0);
    rig.command(
        "t1",
        json!({"action": "move", "direction": "forward", "duration_ms": 3000}),
    );
    assert!(rig.control.service().is_pending(TimedAction::StopMotion));

    // The move does not hold up the loop: telemetry keeps its cadence.
    rig.run_until(1_000);
    assert!(rig.motion().is_moving());
    assert_eq!(rig.sink.sensor_data(), 3);

    rig.hw.set_distance_cm(4.0);
    rig.run_until(1_500);
    assert!(rig.armed());
    assert_eq!(rig.hw.motion(), Motion::Stopped);
    assert_eq!(
        auto_stop_acks(&rig),
        ["Emergency stop - obstacle too close"]
    );
    assert!(!rig.control.service().is_pending(TimedAction::StopMotion));

    rig.run_until(3_500);
    assert_eq!(rig.sink.sensor_data(), 8);
    assert_eq!(rig.sink.outcomes_for("t1").len(), 1);
    assert_eq!(auto_stop_acks(&rig).len(), 1);
}
