//! Sensor subsystem: individual drivers and the [`SensorSampler`].
//!
//! The sampler turns raw port readings into a [`SensorSample`] of
//! [`Reading`]s.  A switched-off sensor is reported as
//! [`Reading::Disabled`] without touching the hardware; a ping with no echo
//! or a failed ADC conversion is [`Reading::Unavailable`], never zero.

pub mod smoke;
pub mod ultrasonic;

use crate::app::ports::SensorPort;
use crate::config::RobotConfig;
use crate::state::{Reading, SensorEnables, SensorSample};

/// Converts raw sensor port readings into calibrated samples.
#[derive(Debug, Clone, Copy)]
pub struct SensorSampler {
    echo_timeout_us: u32,
    max_range_cm: f32,
}

impl SensorSampler {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            echo_timeout_us: config.echo_timeout_us,
            max_range_cm: config.max_range_cm,
        }
    }

    /// Read every enabled sensor once.
    pub fn sample(&self, port: &mut impl SensorPort, enables: SensorEnables) -> SensorSample {
        let distance_cm = if enables.ultrasonic {
            match port.echo_pulse_us(self.echo_timeout_us) {
                Some(us) if us > 0 && us <= self.echo_timeout_us => {
                    Reading::Valid(ultrasonic::echo_to_cm(us, self.max_range_cm))
                }
                _ => Reading::Unavailable,
            }
        } else {
            Reading::Disabled
        };

        let smoke_pct = if enables.smoke {
            match port.smoke_raw() {
                Some(raw) => Reading::Valid(smoke::raw_to_percent(raw)),
                None => Reading::Unavailable,
            }
        } else {
            Reading::Disabled
        };

        SensorSample {
            distance_cm,
            smoke_pct,
        }
    }
}
