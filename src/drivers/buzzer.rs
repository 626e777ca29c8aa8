//! Active buzzer on a single GPIO (HIGH = sounding).

use embedded_hal::digital::{OutputPin, PinState};

pub struct Buzzer<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Buzzer<P> {
    /// Silent on construction.
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin, on: false }
    }

    pub fn set(&mut self, on: bool) {
        let _ = self.pin.set_state(PinState::from(on));
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
