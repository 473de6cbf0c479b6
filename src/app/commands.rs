//! Inbound actuator-state commands.
//!
//! The detector model reports actuator state on the command topics as
//! `{"state": "<name>"}`.  Each known name maps to a fixed LED colour and
//! display text the bridge renders on the device.

use serde::Deserialize;

use crate::drivers::status_led::{
    COLOUR_BLUE, COLOUR_CYAN, COLOUR_GREEN, COLOUR_PURPLE, COLOUR_RED, COLOUR_YELLOW, Rgb,
};

/// Device-side rendering of one actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    SprinklersOn,
    SprinklersOff,
    WindowsClosed,
    WindowsOpen,
    LightsOn,
    LightsOff,
}

impl DeviceCommand {
    pub const ALL: [DeviceCommand; 6] = [
        Self::SprinklersOn,
        Self::SprinklersOff,
        Self::WindowsClosed,
        Self::WindowsOpen,
        Self::LightsOn,
        Self::LightsOff,
    ];

    /// Look up a state name.  `None` for anything outside the table.
    pub fn from_state(state: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.state() == state)
    }

    pub fn state(self) -> &'static str {
        match self {
            Self::SprinklersOn => "sprinklers_on",
            Self::SprinklersOff => "sprinklers_off",
            Self::WindowsClosed => "windows_closed",
            Self::WindowsOpen => "windows_open",
            Self::LightsOn => "lights_on",
            Self::LightsOff => "lights_off",
        }
    }

    pub fn rgb(self) -> Rgb {
        match self {
            Self::SprinklersOn => COLOUR_RED,
            Self::SprinklersOff => COLOUR_GREEN,
            Self::WindowsClosed => COLOUR_BLUE,
            Self::WindowsOpen => COLOUR_YELLOW,
            Self::LightsOn => COLOUR_CYAN,
            Self::LightsOff => COLOUR_PURPLE,
        }
    }

    /// Two-line text for the device display.
    pub fn text(self) -> &'static str {
        match self {
            Self::SprinklersOn => "Sprinklers \nare on",
            Self::SprinklersOff => "Sprinklers \nare off",
            Self::WindowsClosed => "Windows \nare closed",
            Self::WindowsOpen => "Windows \nare open",
            Self::LightsOn => "Lights \nare on",
            Self::LightsOff => "Lights \nare off",
        }
    }
}

#[derive(Debug, Deserialize)]
struct StateMessage {
    state: String,
}

/// Extract the `state` field from a command payload.
pub fn parse_state(payload: &[u8]) -> serde_json::Result<String> {
    serde_json::from_slice::<StateMessage>(payload).map(|m| m.state)
}
