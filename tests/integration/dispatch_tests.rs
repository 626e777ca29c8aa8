//! Websocket command dispatch: envelope in, actuators + ack/error out.

use emubot::app::events::{MAX_COMMAND_ID_LEN, OutboundEvent};
use emubot::state::{Expression, Magnitude, Motion};
use serde_json::json;

use crate::mock_hw::{ActuatorCall, Rig};

#[test]
fn move_forward_drives_both_wheels_and_acks() {
    let mut rig = Rig::new();
    rig.command("m1", json!({"action": "move", "direction": "forward"}));

    assert_eq!(rig.hw.motion(), Motion::Forward(Magnitude::even(200)));
    assert_eq!(rig.sink.acks_for("m1"), 1);
    assert_eq!(
        rig.sink.last_message_for("m1").as_deref(),
        Some("Movement command executed")
    );
}

#[test]
fn turns_use_turn_duty() {
    let mut rig = Rig::new();
    rig.command("l", json!({"action": "move", "direction": "left"}));
    assert_eq!(rig.motion(), Motion::TurnLeft(Magnitude::even(150)));
}

#[test]
fn every_command_is_followed_by_status() {
    let mut rig = Rig::new();
    rig.step();
    rig.sink.clear();

    rig.command("o1", json!({"action": "oled", "text": "hi"}));
    let kinds: Vec<_> = rig
        .sink
        .events
        .iter()
        .map(|e| match e {
            OutboundEvent::CommandAck { .. } => "ack",
            OutboundEvent::Error { .. } => "error",
            OutboundEvent::StatusUpdate(_) => "status",
            OutboundEvent::SensorData(_) => "sensor",
        })
        .collect();
    assert_eq!(kinds, ["ack", "status"]);
}

#[test]
fn rejected_command_leaves_state_untouched() {
    let mut rig = Rig::new();
    rig.command("m1", json!({"action": "move", "direction": "forward"}));
    let before = rig.control.service().status(0);

    rig.command("bad", json!({"action": "move", "direction": "sideways"}));

    assert_eq!(rig.sink.errors_for("bad"), 1);
    assert_eq!(
        rig.sink.last_message_for("bad").as_deref(),
        Some("move: unknown direction 'sideways'")
    );
    assert_eq!(rig.control.service().status(0), before);
}

#[test]
fn unknown_action_is_reported_by_name() {
    let mut rig = Rig::new();
    rig.command("x", json!({"action": "dance"}));
    assert_eq!(
        rig.sink.last_message_for("x").as_deref(),
        Some("Unknown command: dance")
    );
}

#[test]
fn malformed_and_foreign_frames_are_dropped_silently() {
    let mut rig = Rig::new();
    rig.step();
    rig.sink.clear();

    rig.inbound.push_json(&json!({"type": "status_update", "data": {}}));
    rig.inbound
        .push_json(&json!({"type": "command", "data": {"action": "move"}}));
    rig.step();

    assert!(rig.sink.events.is_empty());
    assert!(rig.hw.calls.iter().all(|c| *c == ActuatorCall::Motion(Motion::Stopped)
        || *c == ActuatorCall::Buzzer(false)));
}

#[test]
fn oled_text_is_truncated_to_21_chars() {
    let mut rig = Rig::new();
    rig.command(
        "o",
        json!({"action": "oled", "text": "The quick brown fox jumps over the lazy dog"}),
    );
    let text = rig.control.service().state().display_text.clone();
    assert_eq!(text.as_str(), "The quick brown fox j");
    assert_eq!(rig.sink.acks_for("o"), 1);
}

#[test]
fn expression_change_is_acknowledged_and_drawn() {
    let mut rig = Rig::new();
    rig.command("e", json!({"action": "expression", "expression": "happy"}));

    let state = rig.control.service().state();
    assert_eq!(state.requested_expression, Expression::Happy);
    assert_eq!(state.effective_expression, Expression::Happy);
    assert_eq!(
        rig.sink.last_message_for("e").as_deref(),
        Some("Expression changed to happy")
    );
    assert!(!rig.display.frames.is_empty());
}

#[test]
fn timed_buzzer_switches_itself_off() {
    let mut rig = Rig::new();
    rig.command("b", json!({"action": "buzzer", "state": "on", "duration_ms": 200}));
    assert!(rig.hw.buzzer_on());

    rig.run_until(180);
    assert!(rig.hw.buzzer_on());
    rig.run_until(200);
    assert!(!rig.hw.buzzer_on());
    assert!(!rig.control.service().state().buzzer_on);
}

#[test]
fn new_move_replaces_pending_timed_stop() {
    let mut rig = Rig::new();
    rig.command(
        "a",
        json!({"action": "move", "direction": "forward", "duration_ms": 100}),
    );
    rig.command("b", json!({"action": "move", "direction": "left"}));

    rig.run_until(400);
    assert_eq!(rig.motion(), Motion::TurnLeft(Magnitude::even(150)));
}

#[test]
fn sensor_toggle_disables_sampling() {
    let mut rig = Rig::new();
    rig.command(
        "s",
        json!({"action": "sensor_toggle", "sensor": "smoke", "enabled": false}),
    );
    assert_eq!(
        rig.sink.last_message_for("s").as_deref(),
        Some("Smoke sensor disabled")
    );

    let reads = rig.hw.smoke_reads;
    rig.run_until(2_000);
    assert_eq!(rig.hw.smoke_reads, reads);
    assert!(rig.hw.pings > 0);
}

#[test]
fn set_thresholds_validates_merged_values() {
    let mut rig = Rig::new();
    rig.command(
        "t1",
        json!({"action": "set_thresholds", "thresholds": {"ultrasonicDanger": 30}}),
    );
    assert_eq!(rig.sink.errors_for("t1"), 1);

    rig.command(
        "t2",
        json!({"action": "set_thresholds", "thresholds": {"ultrasonicDanger": 15, "smokeSensitivity": 70}}),
    );
    assert_eq!(rig.sink.acks_for("t2"), 1);
    let t = rig.control.service().state().thresholds();
    assert_eq!(t.danger_distance_cm, 15.0);
    assert_eq!(t.warning_distance_cm, 25.0);
    assert_eq!(t.smoke_sensitivity_pct, 70.0);
}

#[test]
fn numeric_command_ids_are_echoed_as_strings() {
    let mut rig = Rig::new();
    rig.inbound.push_json(&json!({
        "type": "command",
        "id": 17,
        "data": {"action": "buzzer", "state": "off"},
    }));
    rig.step();
    assert_eq!(rig.sink.acks_for("17"), 1);
}

#[test]
fn long_command_ids_are_echoed_verbatim() {
    let mut rig = Rig::new();
    let id = "client-7f3a9c2e-1b4d-4e8f-9a6b-0c1d2e3f4a5b-req-42";
    rig.command(id, json!({"action": "buzzer", "state": "on"}));
    assert_eq!(rig.sink.acks_for(id), 1);
    assert_eq!(
        rig.sink.events.iter().filter_map(OutboundEvent::command_id).last(),
        Some(id)
    );
}

#[test]
fn overlong_command_id_is_dropped_not_truncated() {
    let mut rig = Rig::new();
    rig.step();
    rig.sink.clear();

    let id = "r".repeat(MAX_COMMAND_ID_LEN + 1);
    rig.command(&id, json!({"action": "buzzer", "state": "on"}));

    assert!(rig.sink.events.is_empty());
    assert!(!rig.hw.buzzer_on());
}

#[test]
fn long_oled_frame_is_truncated_not_dropped() {
    let mut rig = Rig::new();
    let text = "EMU ".repeat(200);
    rig.command("big", json!({"action": "oled", "text": text}));
    assert_eq!(rig.sink.acks_for("big"), 1);
    assert_eq!(
        rig.control.service().state().display_text.as_str(),
        "EMU EMU EMU EMU EMU E"
    );
}
