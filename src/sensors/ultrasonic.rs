//! HC-SR04 ultrasonic ranger.
//!
//! A 10 µs trigger pulse starts a ping; the echo line then stays HIGH for
//! the round-trip time of the sound.  The whole measurement (waiting for
//! the rising edge and for the falling edge) is bounded by one timeout so a
//! missing or stuck echo never stalls the control loop for longer than
//! that.
//!
//! The driver is generic over `embedded-hal` 1.0 pins and delay, plus a
//! free-running microsecond clock (`esp_timer_get_time` on the device).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Speed of sound, centimetres per microsecond.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.034;

/// Convert an echo pulse width to a one-way distance, clamped to the
/// sensor's usable range.
pub fn echo_to_cm(echo_us: u32, max_range_cm: f32) -> f32 {
    (echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0).clamp(0.0, max_range_cm)
}

pub struct UltrasonicRanger<T, E, D> {
    trig: T,
    echo: E,
    delay: D,
    micros: fn() -> u64,
}

impl<T, E, D> UltrasonicRanger<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    pub fn new(trig: T, echo: E, delay: D, micros: fn() -> u64) -> Self {
        Self {
            trig,
            echo,
            delay,
            micros,
        }
    }

    /// Ping once and return the echo pulse width in microseconds.
    ///
    /// `None` if no complete echo arrived within `timeout_us` or a pin
    /// access failed.
    pub fn measure_echo_us(&mut self, timeout_us: u32) -> Option<u32> {
        self.trig.set_low().ok()?;
        self.delay.delay_us(2);
        self.trig.set_high().ok()?;
        self.delay.delay_us(10);
        self.trig.set_low().ok()?;

        let deadline = (self.micros)() + u64::from(timeout_us);

        while !self.echo.is_high().ok()? {
            if (self.micros)() >= deadline {
                return None;
            }
        }
        let rise = (self.micros)();

        while self.echo.is_high().ok()? {
            if (self.micros)() >= deadline {
                return None;
            }
        }
        let width = (self.micros)().saturating_sub(rise);

        u32::try_from(width).ok().filter(|w| *w > 0)
    }
}
