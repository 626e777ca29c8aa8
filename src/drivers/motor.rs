//! Differential drive train (L298N dual H-bridge).
//!
//! Each wheel has two direction inputs and one PWM enable line.  A
//! [`Motion`] is turned into a pair of [`WheelCommand`]s and written to both
//! bridges in one call.
//!
//! | Motion     | left              | right             |
//! |------------|-------------------|-------------------|
//! | Forward    | Forward           | Forward           |
//! | Backward   | Reverse           | Reverse           |
//! | TurnLeft   | Reverse           | Forward           |
//! | TurnRight  | Forward           | Reverse           |
//! | Stopped    | Brake (duty 0)    | Brake (duty 0)    |
//!
//! This driver is a dumb actuator: pin errors are swallowed and the
//! safety latch is enforced by the control core.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use crate::state::Motion;

/// Rotation of one wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Forward,
    Reverse,
    /// Both direction inputs low.
    Brake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelCommand {
    pub spin: Spin,
    /// 8-bit PWM duty, 0–255.
    pub duty: u8,
}

impl WheelCommand {
    pub const BRAKE: Self = Self {
        spin: Spin::Brake,
        duty: 0,
    };

    /// `(left, right)` commands for `motion`.
    pub fn pair_for(motion: Motion) -> (Self, Self) {
        let m = motion.magnitude();
        let cmd = |spin, duty| Self { spin, duty };
        match motion {
            Motion::Stopped => (Self::BRAKE, Self::BRAKE),
            Motion::Forward(_) => (cmd(Spin::Forward, m.left), cmd(Spin::Forward, m.right)),
            Motion::Backward(_) => (cmd(Spin::Reverse, m.left), cmd(Spin::Reverse, m.right)),
            Motion::TurnLeft(_) => (cmd(Spin::Reverse, m.left), cmd(Spin::Forward, m.right)),
            Motion::TurnRight(_) => (cmd(Spin::Forward, m.left), cmd(Spin::Reverse, m.right)),
        }
    }
}

/// Anything that can execute a [`WheelCommand`].
pub trait Wheel {
    fn drive(&mut self, cmd: WheelCommand);
}

/// One half of the L298N: IN1/IN2 direction pins and the EN PWM line.
pub struct HBridge<A, B, P> {
    in1: A,
    in2: B,
    enable: P,
}

impl<A, B, P> HBridge<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    pub fn new(in1: A, in2: B, enable: P) -> Self {
        Self { in1, in2, enable }
    }
}

impl<A, B, P> Wheel for HBridge<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    fn drive(&mut self, cmd: WheelCommand) {
        let (in1, in2, duty) = match cmd.spin {
            Spin::Forward => (true, false, cmd.duty),
            Spin::Reverse => (false, true, cmd.duty),
            Spin::Brake => (false, false, 0),
        };
        // Duty first when braking so the bridge never sees a stale drive.
        if duty == 0 {
            let _ = self.enable.set_duty_cycle_fully_off();
        }
        let _ = self.in1.set_state(PinState::from(in1));
        let _ = self.in2.set_state(PinState::from(in2));
        if duty > 0 {
            let _ = self.enable.set_duty_cycle_fraction(u16::from(duty), 255);
        }
    }
}

/// Left and right wheels driven together.
pub struct DriveTrain<L, R> {
    left: L,
    right: R,
    current: Motion,
}

impl<L: Wheel, R: Wheel> DriveTrain<L, R> {
    /// Wheels are braked on construction.
    pub fn new(mut left: L, mut right: R) -> Self {
        left.drive(WheelCommand::BRAKE);
        right.drive(WheelCommand::BRAKE);
        Self {
            left,
            right,
            current: Motion::Stopped,
        }
    }

    pub fn apply(&mut self, motion: Motion) {
        let (l, r) = WheelCommand::pair_for(motion);
        self.left.drive(l);
        self.right.drive(r);
        self.current = motion;
    }

    pub fn stop(&mut self) {
        self.apply(Motion::Stopped);
    }

    pub fn current(&self) -> Motion {
        self.current
    }
}
