//! Fuzz target: envelope decode + dispatch.
//!
//! Drives arbitrary bytes through `envelope::decode` and, when they decode,
//! through the full command dispatcher against inert hardware.  Asserts
//! that nothing panics and that the display text bound always holds.
//!
//! cargo fuzz run fuzz_envelope_decode

#![no_main]

use emubot::app::events::OutboundEvent;
use emubot::app::ports::{ActuatorPort, EventSink, SensorPort};
use emubot::app::service::RobotService;
use emubot::config::RobotConfig;
use emubot::protocol::envelope;
use emubot::state::{DISPLAY_TEXT_MAX_CHARS, Motion};
use libfuzzer_sys::fuzz_target;

struct Inert;

impl SensorPort for Inert {
    fn echo_pulse_us(&mut self, _timeout_us: u32) -> Option<u32> {
        None
    }
    fn smoke_raw(&mut self) -> Option<u16> {
        None
    }
}

impl ActuatorPort for Inert {
    fn apply_motion(&mut self, _motion: Motion) {}
    fn set_buzzer(&mut self, _on: bool) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &OutboundEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = envelope::decode(data) else {
        return;
    };
    assert!(!raw.id.is_empty(), "decoded command without id");

    let mut service = RobotService::new(RobotConfig::default());
    service.start(&mut Inert, 0);
    service.dispatch(&raw, &mut Inert, &mut Discard, 0);

    let state = service.state();
    assert!(state.display_text.as_str().chars().count() <= DISPLAY_TEXT_MAX_CHARS);
    assert!(state.thresholds().validate().is_ok());
});
