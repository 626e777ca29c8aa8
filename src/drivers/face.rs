//! Face frames for the 128×64 panel.
//!
//! The panel shows two identical 8×8 eyes (scaled up by the display
//! adapter), an optional decoration and one line of text.  This module only
//! decides *what* is on the face; pixel pushing belongs to the
//! [`DisplayPort`] adapter.

use crate::app::ports::DisplayPort;
use crate::state::{DisplayText, Expression, RobotState};

/// Eye shape currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Expression(Expression),
    /// Eyes-closed overlay during a blink pulse.
    Blink,
}

/// Extra artwork drawn next to the eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    None,
    Sparkles,
    ThoughtBubble,
}

/// One 8×8 eye, MSB = leftmost pixel.
pub type EyeBitmap = [u8; 8];

const NEUTRAL: EyeBitmap = [0x3C, 0x7E, 0xFF, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C];
const HAPPY: EyeBitmap = [0x3C, 0x66, 0xC3, 0xC3, 0xC3, 0xC3, 0x66, 0x3C];
const SAD: EyeBitmap = [0x3C, 0x7E, 0xFF, 0xE7, 0xE7, 0xFF, 0x7E, 0x3C];
const SURPRISED: EyeBitmap = [0x1C, 0x3E, 0x7F, 0xFF, 0xFF, 0x7F, 0x3E, 0x1C];
const ANGRY: EyeBitmap = [0x01, 0x07, 0x1F, 0x7F, 0xFF, 0xFC, 0xF0, 0xC0];
const BLINK: EyeBitmap = [0x00, 0x00, 0x7E, 0x7E, 0x7E, 0x7E, 0x00, 0x00];
const THINKING: EyeBitmap = [0x3C, 0x7E, 0xDB, 0xFF, 0xFF, 0xDB, 0x7E, 0x3C];
const EXCITED: EyeBitmap = [0x18, 0x3C, 0x7E, 0xFF, 0xFF, 0x7E, 0x3C, 0x18];

impl Glyph {
    pub fn bitmap(self) -> &'static EyeBitmap {
        match self {
            Self::Blink => &BLINK,
            Self::Expression(e) => match e {
                Expression::Neutral => &NEUTRAL,
                Expression::Happy => &HAPPY,
                Expression::Sad => &SAD,
                Expression::Surprised => &SURPRISED,
                Expression::Angry => &ANGRY,
                Expression::Thinking => &THINKING,
                Expression::Excited => &EXCITED,
            },
        }
    }
}

/// Everything the panel needs to draw one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceFrame {
    pub glyph: Glyph,
    pub decoration: Decoration,
    pub text: DisplayText,
}

impl FaceFrame {
    /// The face implied by `state`: blink overlay over the effective
    /// expression.
    pub fn for_state(state: &RobotState) -> Self {
        let glyph = if state.blink.is_blinking {
            Glyph::Blink
        } else {
            Glyph::Expression(state.effective_expression)
        };
        let decoration = match state.effective_expression {
            Expression::Excited => Decoration::Sparkles,
            Expression::Thinking => Decoration::ThoughtBubble,
            _ => Decoration::None,
        };
        Self {
            glyph,
            decoration,
            text: state.display_text.clone(),
        }
    }

    /// Eye rows as `#`/`.` strings, for serial-console rendering.
    pub fn eye_rows(&self) -> impl Iterator<Item = heapless::String<8>> + '_ {
        self.glyph.bitmap().iter().map(|row| {
            let mut line = heapless::String::new();
            for bit in (0..8).rev() {
                let px = if row & (1 << bit) != 0 { '#' } else { '.' };
                let _ = line.push(px);
            }
            line
        })
    }
}

/// Pushes a frame to the display only when it differs from the last one.
#[derive(Debug, Default)]
pub struct FaceRenderer {
    last: Option<FaceFrame>,
}

impl FaceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `state` if the face changed.  Returns whether a frame was
    /// pushed.
    pub fn refresh(&mut self, state: &RobotState, display: &mut impl DisplayPort) -> bool {
        let frame = FaceFrame::for_state(state);
        if self.last.as_ref() == Some(&frame) {
            return false;
        }
        display.render(&frame);
        self.last = Some(frame);
        true
    }

    /// Force the next refresh to redraw.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
