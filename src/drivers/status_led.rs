//! RGB status LED state.
//!
//! The device renders actuator state as a solid colour.  This module owns
//! the colour type, the well-known colours, and a tracker adapters use to
//! remember what the LED currently shows.

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

// ── Well-known colour constants ───────────────────────────────

pub const COLOUR_RED: Rgb = (255, 0, 0);
pub const COLOUR_GREEN: Rgb = (0, 255, 0);
pub const COLOUR_BLUE: Rgb = (0, 0, 255);
pub const COLOUR_YELLOW: Rgb = (255, 255, 0);
pub const COLOUR_CYAN: Rgb = (0, 255, 255);
pub const COLOUR_PURPLE: Rgb = (255, 0, 255);
pub const COLOUR_OFF: Rgb = (0, 0, 0);

pub struct StatusLed {
    current: Rgb,
}

impl StatusLed {
    pub fn new() -> Self {
        Self {
            current: COLOUR_OFF,
        }
    }

    pub fn set_colour(&mut self, rgb: Rgb) {
        self.current = rgb;
    }

    pub fn off(&mut self) {
        self.set_colour(COLOUR_OFF);
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}
