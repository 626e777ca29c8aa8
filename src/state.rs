//! Robot state blackboard.
//!
//! Exactly one [`RobotState`] exists for the lifetime of the process.  It
//! is owned by [`RobotService`](crate::app::service::RobotService) and is
//! only mutated from the control-loop thread, either inside one loop
//! iteration or inside one command dispatch, so no reader ever sees a
//! half-applied combination of fields.
//!
//! ## Invariants
//!
//! - `safety.armed` ⇒ `motion == Stopped` and `effective_expression == Surprised`.
//! - `display_text` never exceeds [`DISPLAY_TEXT_MAX_CHARS`] characters.
//! - `thresholds` always pass [`Thresholds::validate`].

use core::fmt;

use serde::Serialize;

use crate::config::{RobotConfig, Thresholds};
use crate::error::ConfigError;

/// Copy as much of `s` as fits into a fixed-capacity string, never
/// splitting a character.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  Motion
// ═══════════════════════════════════════════════════════════════

/// Left/right PWM magnitude pair (0–255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Magnitude {
    pub left: u8,
    pub right: u8,
}

impl Magnitude {
    pub const ZERO: Self = Self { left: 0, right: 0 };

    pub const fn even(duty: u8) -> Self {
        Self {
            left: duty,
            right: duty,
        }
    }
}

/// Commanded motion of the drive train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    #[default]
    Stopped,
    Forward(Magnitude),
    Backward(Magnitude),
    TurnLeft(Magnitude),
    TurnRight(Magnitude),
}

impl Motion {
    /// Motion for a `move` direction, using the configured duty policy.
    pub fn for_direction(direction: Direction, config: &RobotConfig) -> Self {
        match direction {
            Direction::Forward => Self::Forward(Magnitude::even(config.straight_duty)),
            Direction::Backward => Self::Backward(Magnitude::even(config.straight_duty)),
            Direction::Left => Self::TurnLeft(Magnitude::even(config.turn_duty)),
            Direction::Right => Self::TurnRight(Magnitude::even(config.turn_duty)),
            Direction::Stop => Self::Stopped,
        }
    }

    pub fn magnitude(self) -> Magnitude {
        match self {
            Self::Stopped => Magnitude::ZERO,
            Self::Forward(m) | Self::Backward(m) | Self::TurnLeft(m) | Self::TurnRight(m) => m,
        }
    }

    pub fn is_moving(self) -> bool {
        !matches!(self, Self::Stopped)
    }

    /// Signed wheel speeds as reported in status (reverse is negative).
    pub fn wheel_speeds(self) -> (i16, i16) {
        let m = self.magnitude();
        let (l, r) = (i16::from(m.left), i16::from(m.right));
        match self {
            Self::Stopped => (0, 0),
            Self::Forward(_) => (l, r),
            Self::Backward(_) => (-l, -r),
            Self::TurnLeft(_) => (-l, r),
            Self::TurnRight(_) => (l, -r),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Forward(_) => "forward",
            Self::Backward(_) => "backward",
            Self::TurnLeft(_) => "left",
            Self::TurnRight(_) => "right",
        }
    }
}

/// Direction names accepted by `move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Self::Forward),
            "backward" => Some(Self::Backward),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Stop => "stop",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Expression
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    #[default]
    Neutral,
    Happy,
    Sad,
    Surprised,
    Angry,
    Thinking,
    Excited,
}

impl Expression {
    pub const ALL: [Self; 7] = [
        Self::Neutral,
        Self::Happy,
        Self::Sad,
        Self::Surprised,
        Self::Angry,
        Self::Thinking,
        Self::Excited,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprised => "surprised",
            Self::Angry => "angry",
            Self::Thinking => "thinking",
            Self::Excited => "excited",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sensors
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Ultrasonic,
    Smoke,
}

impl SensorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ultrasonic" => Some(Self::Ultrasonic),
            "smoke" => Some(Self::Smoke),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ultrasonic => "Ultrasonic",
            Self::Smoke => "Smoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorEnables {
    pub ultrasonic: bool,
    pub smoke: bool,
}

impl Default for SensorEnables {
    fn default() -> Self {
        Self {
            ultrasonic: true,
            smoke: true,
        }
    }
}

impl SensorEnables {
    pub fn is_enabled(self, kind: SensorKind) -> bool {
        match kind {
            SensorKind::Ultrasonic => self.ultrasonic,
            SensorKind::Smoke => self.smoke,
        }
    }

    pub fn set(&mut self, kind: SensorKind, enabled: bool) {
        match kind {
            SensorKind::Ultrasonic => self.ultrasonic = enabled,
            SensorKind::Smoke => self.smoke = enabled,
        }
    }
}

/// One sensor measurement.  Unavailable and disabled readings are kept
/// distinct from every numeric value and are never coerced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
    Valid(f32),
    /// No echo within the timeout, or not sampled yet.
    #[default]
    Unavailable,
    /// The sensor is switched off.
    Disabled,
}

impl Reading {
    pub fn value(self) -> Option<f32> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Unavailable | Self::Disabled => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(v) => write!(f, "{v:.1}"),
            Self::Unavailable => write!(f, "n/a"),
            Self::Disabled => write!(f, "off"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    pub distance_cm: Reading,
    pub smoke_pct: Reading,
}

/// Distance classification reported alongside telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    Clear,
    Warning,
    Danger,
    Unknown,
}

impl Proximity {
    pub fn classify(distance: Reading, thresholds: &Thresholds) -> Self {
        match distance.value() {
            None => Self::Unknown,
            Some(d) if d < thresholds.danger_distance_cm => Self::Danger,
            Some(d) if d < thresholds.warning_distance_cm => Self::Warning,
            Some(_) => Self::Clear,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Unknown => "unknown",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Safety latch
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyReason {
    ObstacleTooClose,
    SmokeDetected,
}

impl SafetyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObstacleTooClose => "obstacle_too_close",
            Self::SmokeDetected => "smoke_detected",
        }
    }
}

impl fmt::Display for SafetyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObstacleTooClose => write!(f, "obstacle too close"),
            Self::SmokeDetected => write!(f, "smoke detected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyLatch {
    pub armed: bool,
    pub reason: Option<SafetyReason>,
}

// ═══════════════════════════════════════════════════════════════
//  Display text
// ═══════════════════════════════════════════════════════════════

/// Visible character budget of one display line.
pub const DISPLAY_TEXT_MAX_CHARS: usize = 21;

/// Display line, truncated to [`DISPLAY_TEXT_MAX_CHARS`] characters when
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayText(heapless::String<{ DISPLAY_TEXT_MAX_CHARS * 4 }>);

impl DisplayText {
    pub fn new(text: &str) -> Self {
        let mut t = Self::default();
        t.set(text);
        t
    }

    pub fn set(&mut self, text: &str) {
        self.0.clear();
        for ch in text.chars().take(DISPLAY_TEXT_MAX_CHARS) {
            // Capacity covers 21 four-byte chars, so this cannot fail.
            if self.0.push(ch).is_err() {
                break;
            }
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Blink timer
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlinkState {
    pub is_blinking: bool,
    pub next_blink_due_at: u64,
    pub blink_ends_at: u64,
}

// ═══════════════════════════════════════════════════════════════
//  RobotState
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct RobotState {
    pub motion: Motion,
    pub buzzer_on: bool,
    pub display_text: DisplayText,
    /// Last expression asked for by a command or a routine.
    pub requested_expression: Expression,
    /// What the face shows underneath any blink overlay.
    pub effective_expression: Expression,
    pub sensors_enabled: SensorEnables,
    thresholds: Thresholds,
    pub safety: SafetyLatch,
    pub last_sample: SensorSample,
    pub blink: BlinkState,
}

impl RobotState {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            motion: Motion::Stopped,
            buzzer_on: false,
            display_text: DisplayText::new(&config.boot_text),
            requested_expression: Expression::Neutral,
            effective_expression: Expression::Neutral,
            sensors_enabled: SensorEnables::default(),
            thresholds: config.thresholds,
            safety: SafetyLatch::default(),
            last_sample: SensorSample::default(),
            blink: BlinkState::default(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Swap in new thresholds.  Invalid values leave the current ones intact.
    pub fn replace_thresholds(&mut self, thresholds: Thresholds) -> Result<(), ConfigError> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        Ok(())
    }

    pub fn proximity(&self) -> Proximity {
        Proximity::classify(self.last_sample.distance_cm, &self.thresholds)
    }

    /// Latest smoke reading exceeds the configured sensitivity.
    pub fn smoke_detected(&self) -> bool {
        self.last_sample
            .smoke_pct
            .value()
            .is_some_and(|s| s > self.thresholds.smoke_sensitivity_pct)
    }
}
