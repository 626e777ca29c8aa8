//! Error types for the EMU controller.
//!
//! Nothing in the control core is fatal.  A [`DecodeError`] drops the
//! offending frame, a [`CommandError`] becomes one `error` event correlated
//! with the command id, and a [`ConfigError`] rejects the update that
//! caused it.  All variants are cheap to clone and carry no heap data.

use core::fmt;

use crate::state::{SafetyReason, bounded};

/// Bounded echo of an offending value (action name, direction, ...).
pub type Token = heapless::String<24>;

/// Copy `s` into a [`Token`], truncating at a char boundary.
pub fn token(s: &str) -> Token {
    bounded(s)
}

// ---------------------------------------------------------------------------
// Envelope decode errors
// ---------------------------------------------------------------------------

/// Inbound frame could not be turned into a command.  Never answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Not valid JSON, or not a JSON object.
    Malformed,
    /// Valid envelope whose `type` is not `command`.
    NotACommand,
    /// Command envelope without a usable `id`.
    MissingId,
    /// `id` longer than a `CommandId` can hold (byte length attached).
    IdTooLong(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed envelope"),
            Self::NotACommand => write!(f, "envelope is not a command"),
            Self::MissingId => write!(f, "command without id"),
            Self::IdTooLong(len) => write!(f, "command id of {len} bytes is too long"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Why a running routine stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    /// The safety latch armed mid-routine.
    Safety(SafetyReason),
    /// A later motion command took over the wheels.
    Superseded(&'static str),
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safety(reason) => write!(f, "emergency stop ({reason})"),
            Self::Superseded(by) => write!(f, "superseded by {by}"),
        }
    }
}

/// A recognised command envelope that could not be applied.
///
/// The `Display` text is what the client sees in the `error` event and
/// always names the offending action.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// `data.action` absent or not a string.
    MissingAction,
    UnknownAction(Token),
    MissingParameter {
        action: &'static str,
        param: &'static str,
    },
    InvalidParameter {
        action: &'static str,
        param: &'static str,
    },
    UnknownDirection(Token),
    UnknownExpression(Token),
    UnknownSensor(Token),
    InvalidThresholds(ConfigError),
    /// Motion refused while the safety latch is armed.
    SafetyLockout {
        action: &'static str,
        reason: SafetyReason,
    },
    /// A routine that had already been accepted did not complete.
    Aborted {
        action: &'static str,
        cause: AbortCause,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAction => write!(f, "Missing action"),
            Self::UnknownAction(action) => write!(f, "Unknown command: {action}"),
            Self::MissingParameter { action, param } => {
                write!(f, "{action}: missing {param} parameter")
            }
            Self::InvalidParameter { action, param } => {
                write!(f, "{action}: invalid {param} parameter")
            }
            Self::UnknownDirection(d) => write!(f, "move: unknown direction '{d}'"),
            Self::UnknownExpression(e) => write!(f, "expression: unknown expression '{e}'"),
            Self::UnknownSensor(s) => write!(f, "sensor_toggle: unknown sensor '{s}'"),
            Self::InvalidThresholds(e) => write!(f, "set_thresholds: {e}"),
            Self::SafetyLockout { action, reason } => {
                write!(f, "{action}: blocked by emergency stop ({reason})")
            }
            Self::Aborted { action, cause } => write!(f, "{action} aborted: {cause}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidThresholds(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A configuration value failed range validation.
///
/// The `&'static str` describes which field and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
