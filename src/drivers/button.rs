//! Front-panel buttons used to exercise decision branches by hand.
//!
//! Each button injects one fixed sensor value so an operator can drive
//! the downstream detector model into a known branch without real sensor
//! hardware:
//!
//! | Button | Channel     | Value | Branch exercised        |
//! |--------|-------------|-------|-------------------------|
//! | A      | temperature | 30.0  | above 25 °C (hot)       |
//! | B      | temperature | 20.0  | at/below 25 °C          |
//! | X      | humidity    | 10.0  | below 20 % (dry)        |
//! | Y      | humidity    | 30.0  | at/above 20 %           |

use crate::sensors::SensorChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::A, Button::B, Button::X, Button::Y];

    /// Parse the single-letter label printed on the device (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "X" | "x" => Some(Self::X),
            "Y" | "y" => Some(Self::Y),
            _ => None,
        }
    }

    /// The sensor channel and value this button injects.
    pub fn preset(self) -> (SensorChannel, f64) {
        match self {
            Self::A => (SensorChannel::Temperature, 30.0),
            Self::B => (SensorChannel::Temperature, 20.0),
            Self::X => (SensorChannel::Humidity, 10.0),
            Self::Y => (SensorChannel::Humidity, 30.0),
        }
    }
}
