//! Robot configuration parameters
//!
//! All tunable parameters for the EMU controller.  Only the safety
//! [`Thresholds`] can change at runtime (via the `set_thresholds`
//! command); everything else is fixed at boot.  Nothing is persisted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::bounded;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Distance and smoke thresholds consulted by the safety monitor.
///
/// Field names on the wire match the dashboard's settings page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Distance (cm) below which proximity is reported as a warning.
    #[serde(rename = "ultrasonicWarning")]
    pub warning_distance_cm: f32,
    /// Distance (cm) below which a moving robot is emergency-stopped.
    #[serde(rename = "ultrasonicDanger")]
    pub danger_distance_cm: f32,
    /// Smoke level (0-100 %) above which the robot is emergency-stopped.
    #[serde(rename = "smokeSensitivity")]
    pub smoke_sensitivity_pct: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_distance_cm: 25.0,
            danger_distance_cm: 10.0,
            smoke_sensitivity_pct: 50.0,
        }
    }
}

impl Thresholds {
    /// Reject values that would leave the safety latch meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.warning_distance_cm,
            self.danger_distance_cm,
            self.smoke_sensitivity_pct,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "thresholds must be finite and non-negative",
            ));
        }
        if self.danger_distance_cm >= self.warning_distance_cm {
            return Err(ConfigError::ValidationFailed(
                "danger distance must be below warning distance",
            ));
        }
        if self.smoke_sensitivity_pct > 100.0 {
            return Err(ConfigError::ValidationFailed(
                "smoke sensitivity must be within 0-100%",
            ));
        }
        Ok(())
    }
}

/// Partial threshold update carried by `set_thresholds`.
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ThresholdsPatch {
    #[serde(rename = "ultrasonicWarning")]
    pub warning_distance_cm: Option<f32>,
    #[serde(rename = "ultrasonicDanger")]
    pub danger_distance_cm: Option<f32>,
    #[serde(rename = "smokeSensitivity")]
    pub smoke_sensitivity_pct: Option<f32>,
}

impl ThresholdsPatch {
    pub fn is_empty(&self) -> bool {
        self.warning_distance_cm.is_none()
            && self.danger_distance_cm.is_none()
            && self.smoke_sensitivity_pct.is_none()
    }

    /// Merge onto `base`.  The result is not validated.
    pub fn apply_to(&self, base: Thresholds) -> Thresholds {
        Thresholds {
            warning_distance_cm: self.warning_distance_cm.unwrap_or(base.warning_distance_cm),
            danger_distance_cm: self.danger_distance_cm.unwrap_or(base.danger_distance_cm),
            smoke_sensitivity_pct: self
                .smoke_sensitivity_pct
                .unwrap_or(base.smoke_sensitivity_pct),
        }
    }
}

// ---------------------------------------------------------------------------
// Robot configuration
// ---------------------------------------------------------------------------

/// Core controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    // --- Safety ---
    pub thresholds: Thresholds,

    // --- Sensors ---
    /// Sensor sample + safety evaluation + telemetry period (milliseconds)
    pub sensor_interval_ms: u32,
    /// Ultrasonic echo timeout (microseconds)
    pub echo_timeout_us: u32,
    /// Readings beyond this distance are clamped (centimetres)
    pub max_range_cm: f32,

    // --- Drive ---
    /// PWM duty (0-255) for forward / backward motion
    pub straight_duty: u8,
    /// PWM duty (0-255) for on-the-spot turns
    pub turn_duty: u8,
    /// Auto-stop delay for `/move` requests without an explicit duration
    pub rest_move_duration_ms: u32,

    // --- Face ---
    pub blink_min_interval_ms: u32,
    pub blink_max_interval_ms: u32,
    /// How long the eyes stay closed during a blink
    pub blink_pulse_ms: u32,
    /// Text shown on the display at boot
    pub boot_text: heapless::String<32>,
    /// Seed for the blink-interval PRNG
    pub rng_seed: u64,

    // --- Patrol ---
    pub patrol_advance_ms: u32,
    /// An obstacle closer than this after the first advance triggers evasion
    pub patrol_evade_distance_cm: f32,
    pub patrol_backoff_ms: u32,
    pub patrol_evade_turn_ms: u32,
    pub patrol_turn_ms: u32,
    pub patrol_return_ms: u32,

    // --- Scan ---
    pub scan_rotate_ms: u32,
    /// How long the scan result stays on the display
    pub scan_hold_ms: u32,

    // --- Timing ---
    /// Main loop idle period (milliseconds)
    pub loop_interval_ms: u32,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),

            // Sensors
            sensor_interval_ms: 500,
            echo_timeout_us: 30_000,
            max_range_cm: 400.0,

            // Drive
            straight_duty: 200,
            turn_duty: 150,
            rest_move_duration_ms: 2_000,

            // Face
            blink_min_interval_ms: 3_000,
            blink_max_interval_ms: 5_000,
            blink_pulse_ms: 150,
            boot_text: bounded("Hello! I'm EMU"),
            rng_seed: 0x00E3_B0C4_4298_FC1C,

            // Patrol
            patrol_advance_ms: 2_000,
            patrol_evade_distance_cm: 20.0,
            patrol_backoff_ms: 500,
            patrol_evade_turn_ms: 1_000,
            patrol_turn_ms: 1_500,
            patrol_return_ms: 2_000,

            // Scan
            scan_rotate_ms: 500,
            scan_hold_ms: 2_000,

            // Timing
            loop_interval_ms: 20,
        }
    }
}

impl RobotConfig {
    /// Check cross-field constraints.  Call before handing a config to the
    /// service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.sensor_interval_ms == 0 || self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.loop_interval_ms >= self.sensor_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "loop interval must be shorter than the sensor interval",
            ));
        }
        if u64::from(self.echo_timeout_us) >= u64::from(self.sensor_interval_ms) * 1_000 {
            return Err(ConfigError::ValidationFailed(
                "echo timeout must fit inside one sensor interval",
            ));
        }
        if !self.max_range_cm.is_finite() || self.max_range_cm <= 0.0 {
            return Err(ConfigError::ValidationFailed("max range must be positive"));
        }
        if self.straight_duty == 0 || self.turn_duty == 0 {
            return Err(ConfigError::ValidationFailed("drive duties must be non-zero"));
        }
        if self.blink_min_interval_ms > self.blink_max_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "blink min interval exceeds max interval",
            ));
        }
        if self.blink_pulse_ms >= self.blink_min_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "blink pulse must be shorter than the blink interval",
            ));
        }
        Ok(())
    }
}
