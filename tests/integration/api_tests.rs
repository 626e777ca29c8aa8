//! Synchronous API through the control loop: one reply per request.

use emubot::state::{Direction, Motion};
use serde_json::Value;

use crate::mock_hw::Rig;

fn body(rig: &mut Rig, uri: &str) -> (u16, Value) {
    let resp = rig.api(uri);
    (resp.status, serde_json::from_str(&resp.body).unwrap())
}

#[test]
fn status_reports_the_snapshot() {
    let mut rig = Rig::new();
    let (status, json) = body(&mut rig, "/status");
    assert_eq!(status, 200);
    assert_eq!(json["buzzer"], false);
    assert_eq!(json["motors"]["direction"], "stopped");
    assert_eq!(json["oled"]["text"], "Hello! I'm EMU");
    assert_eq!(json["thresholds"]["ultrasonicDanger"], 10.0);
    assert_eq!(json["safety"]["armed"], false);
}

#[test]
fn sensor_reports_sentinels_before_an_echo() {
    let mut rig = Rig::new();
    rig.step();
    let (status, json) = body(&mut rig, "/sensor");
    assert_eq!(status, 200);
    assert_eq!(json["ultrasonic"], "no_echo");
    assert_eq!(json["smoke"], false);
    assert_eq!(json["proximity"], "unknown");
}

#[test]
fn failed_smoke_conversion_reports_unavailable() {
    let mut rig = Rig::new();
    rig.hw.smoke_raw = None;
    rig.step();
    let (_, json) = body(&mut rig, "/sensor");
    assert_eq!(json["smokeLevel"], "unavailable");
    assert_eq!(json["smoke"], false);
    assert!(!rig.armed());
}

#[test]
fn buzzer_switch_and_validation() {
    let mut rig = Rig::new();
    let (status, json) = body(&mut rig, "/buzzer?state=on");
    assert_eq!(status, 200);
    assert_eq!(json["message"], "Buzzer ON");
    assert!(rig.hw.buzzer_on());

    let (status, json) = body(&mut rig, "/buzzer");
    assert_eq!(status, 400);
    assert_eq!(json["error"], "Missing state parameter");

    let (status, _) = body(&mut rig, "/buzzer?state=loud");
    assert_eq!(status, 400);
    assert!(rig.hw.buzzer_on());
}

#[test]
fn oled_updates_text_and_broadcasts_status() {
    let mut rig = Rig::new();
    rig.step();
    rig.sink.clear();

    let (status, _) = body(&mut rig, "/oled?text=Hi%20there");
    assert_eq!(status, 200);
    assert_eq!(
        rig.control.service().state().display_text.as_str(),
        "Hi there"
    );
    assert_eq!(rig.sink.status_updates(), 1);
}

#[test]
fn move_without_duration_auto_stops() {
    let mut rig = Rig::new();
    let (status, _) = body(&mut rig, "/move?direction=forward");
    assert_eq!(status, 200);
    let fwd = Motion::for_direction(Direction::Forward, rig.control.service().config());
    assert_eq!(rig.motion(), fwd);

    rig.run_until(1_980);
    assert_eq!(rig.motion(), fwd);
    rig.run_until(2_000);
    assert_eq!(rig.motion(), Motion::Stopped);
}

#[test]
fn move_with_explicit_duration() {
    let mut rig = Rig::new();
    body(&mut rig, "/move?direction=right&duration=300");
    rig.run_until(300);
    assert_eq!(rig.motion(), Motion::Stopped);

    let (status, json) = body(&mut rig, "/move?direction=right&duration=soon");
    assert_eq!(status, 400);
    assert_eq!(json["error"], "move: invalid duration parameter");
}

#[test]
fn move_errors() {
    let mut rig = Rig::new();
    assert_eq!(body(&mut rig, "/move").0, 400);
    assert_eq!(body(&mut rig, "/move?direction=up").0, 400);
    assert_eq!(body(&mut rig, "/reboot").0, 404);
}

#[test]
fn move_is_a_conflict_while_armed() {
    let mut rig = Rig::new();
    body(&mut rig, "/move?direction=forward");
    rig.hw.set_distance_cm(3.0);
    rig.run_until(500);
    assert!(rig.armed());

    let (status, json) = body(&mut rig, "/move?direction=forward");
    assert_eq!(status, 409);
    assert!(json["error"].as_str().unwrap().contains("emergency stop"));
    assert_eq!(body(&mut rig, "/move?direction=stop").0, 200);
}
