//! Serial-console face display.
//!
//! Stands in for the OLED panel: each new [`FaceFrame`] is logged as an
//! 8×8 eye bitmap plus the text line.  Pixel rendering on the SSD1306 is
//! left to the panel driver.

use log::info;

use crate::app::ports::DisplayPort;
use crate::drivers::face::{Decoration, FaceFrame};

#[derive(Debug, Default)]
pub struct LogDisplay {
    /// Frames rendered since boot.
    frames: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplayPort for LogDisplay {
    fn render(&mut self, frame: &FaceFrame) {
        self.frames = self.frames.wrapping_add(1);
        let extra = match frame.decoration {
            Decoration::None => "",
            Decoration::Sparkles => " *",
            Decoration::ThoughtBubble => " o O",
        };
        info!(
            "FACE #{} | {:?}{extra} | \"{}\"",
            self.frames, frame.glyph, frame.text
        );
        for row in frame.eye_rows() {
            info!("FACE | {row} {row}");
        }
    }
}
