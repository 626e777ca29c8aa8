//! Control loop timing: sample cadence, connect snapshots and the
//! patrol / scan routines driven by deadlines.

use emubot::app::events::OutboundEvent;
use emubot::app::ports::Inbound;
use emubot::routine::RoutineKind;
use emubot::state::{Direction, Expression, Motion};
use serde_json::json;

use crate::mock_hw::Rig;

fn motion_for(rig: &Rig, direction: Direction) -> Motion {
    Motion::for_direction(direction, rig.control.service().config())
}

#[test]
fn samples_every_sensor_period() {
    let mut rig = Rig::new();
    rig.step();
    rig.run_until(2_000);
    // t = 0, 500, 1000, 1500, 2000
    assert_eq!(rig.sink.sensor_data(), 5);
    assert_eq!(rig.hw.pings, 5);
}

#[test]
fn connect_notice_sends_a_status_snapshot() {
    let mut rig = Rig::new();
    rig.step();
    rig.sink.clear();

    rig.inbound.pending.push_back(Inbound::ClientConnected);
    rig.step();
    assert_eq!(rig.sink.status_updates(), 1);
}

#[test]
fn patrol_runs_to_completion_on_a_clear_path() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(150.0);
    rig.command("p1", json!({"action": "patrol"}));

    assert_eq!(rig.sink.acks_for("p1"), 0, "routines ack on completion");
    assert_eq!(
        rig.control.service().routine().map(|r| r.kind()),
        Some(RoutineKind::Patrol)
    );
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Forward));
    assert_eq!(
        rig.control.service().state().requested_expression,
        Expression::Thinking
    );

    rig.run_until(2_000);
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Right));
    rig.run_until(3_500);
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Forward));
    rig.run_until(5_500);

    assert_eq!(rig.motion(), Motion::Stopped);
    assert!(rig.control.service().routine().is_none());
    assert_eq!(rig.sink.acks_for("p1"), 1);
    assert_eq!(
        rig.sink.last_message_for("p1").as_deref(),
        Some("Patrol completed")
    );
    let state = rig.control.service().state();
    assert_eq!(state.requested_expression, Expression::Happy);
    assert_eq!(state.display_text.as_str(), "Patrol done!");
}

#[test]
fn patrol_backs_off_from_a_near_obstacle() {
    let mut rig = Rig::new();
    // Inside the evade distance, outside the danger distance.
    rig.hw.set_distance_cm(15.0);
    rig.command("p2", json!({"action": "patrol"}));

    rig.run_until(2_000);
    assert!(!rig.armed());
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Backward));

    rig.run_until(2_500);
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Right));

    rig.run_until(8_000);
    assert_eq!(rig.sink.acks_for("p2"), 1);
}

#[test]
fn scan_shows_the_reading_then_completes() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(42.0);
    rig.command("s1", json!({"action": "scan"}));
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Right));

    rig.run_until(500);
    assert_eq!(rig.motion(), Motion::Stopped);
    let text = rig.control.service().state().display_text.clone();
    assert!(text.as_str().starts_with("D:42."), "got {text}");

    rig.run_until(2_500);
    assert_eq!(rig.sink.acks_for("s1"), 1);
    assert_eq!(
        rig.control.service().state().display_text.as_str(),
        "Scan complete"
    );
}

#[test]
fn move_supersedes_a_running_routine() {
    let mut rig = Rig::new();
    rig.command("p", json!({"action": "patrol"}));
    rig.command("m", json!({"action": "move", "direction": "left"}));

    assert!(rig.control.service().routine().is_none());
    assert_eq!(rig.sink.errors_for("p"), 1);
    assert_eq!(rig.sink.acks_for("m"), 1);

    // The cancelled step deadline must not fire later.
    rig.run_until(6_000);
    assert_eq!(rig.motion(), motion_for(&rig, Direction::Left));
    assert_eq!(rig.sink.outcomes_for("p").len(), 1);
}

#[test]
fn safety_aborts_a_routine_with_an_error() {
    let mut rig = Rig::new();
    rig.hw.set_distance_cm(100.0);
    rig.command("p", json!({"action": "patrol"}));

    rig.hw.set_distance_cm(3.0);
    rig.run_until(500);

    assert!(rig.armed());
    assert!(rig.control.service().routine().is_none());
    assert_eq!(rig.sink.errors_for("p"), 1);
    assert_eq!(
        rig.sink.last_message_for("p").as_deref(),
        Some("patrol aborted: emergency stop (obstacle too close)")
    );
    assert!(
        rig.sink
            .events
            .iter()
            .any(|e| matches!(e, OutboundEvent::CommandAck { command_id, .. } if command_id.as_str() == "auto_stop"))
    );
}
