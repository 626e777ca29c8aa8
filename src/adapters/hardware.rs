//! Hardware adapter: bridges real peripherals to the domain port traits.
//!
//! Owns the ranger, the smoke sensor, the drive train and the buzzer and
//! exposes them through [`SensorPort`] and [`ActuatorPort`].  Generic over
//! the `embedded-hal` pin types so the device binary plugs in
//! `esp-idf-hal` drivers while host tests plug in mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::motor::{DriveTrain, Wheel};
use crate::sensors::smoke::SmokeSensor;
use crate::sensors::ultrasonic::UltrasonicRanger;
use crate::state::Motion;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<T, E, D, L, R, B> {
    ranger: UltrasonicRanger<T, E, D>,
    smoke: SmokeSensor,
    drive: DriveTrain<L, R>,
    buzzer: Buzzer<B>,
}

impl<T, E, D, L, R, B> HardwareAdapter<T, E, D, L, R, B>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    L: Wheel,
    R: Wheel,
    B: OutputPin,
{
    pub fn new(
        ranger: UltrasonicRanger<T, E, D>,
        smoke: SmokeSensor,
        drive: DriveTrain<L, R>,
        buzzer: Buzzer<B>,
    ) -> Self {
        Self {
            ranger,
            smoke,
            drive,
            buzzer,
        }
    }

    /// Motion the wheels were last commanded to.
    pub fn motion(&self) -> Motion {
        self.drive.current()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<T, E, D, L, R, B> SensorPort for HardwareAdapter<T, E, D, L, R, B>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    L: Wheel,
    R: Wheel,
    B: OutputPin,
{
    fn echo_pulse_us(&mut self, timeout_us: u32) -> Option<u32> {
        self.ranger.measure_echo_us(timeout_us)
    }

    fn smoke_raw(&mut self) -> Option<u16> {
        self.smoke.read_raw()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<T, E, D, L, R, B> ActuatorPort for HardwareAdapter<T, E, D, L, R, B>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    L: Wheel,
    R: Wheel,
    B: OutputPin,
{
    fn apply_motion(&mut self, motion: Motion) {
        self.drive.apply(motion);
    }

    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }
}
