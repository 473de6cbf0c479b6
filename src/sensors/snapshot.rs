//! Latest-value snapshot published on the decision topic.

use serde::{Deserialize, Serialize};

use super::{DeviceSample, SensorChannel};

/// Fixed `inputName` the downstream detector model routes on.
pub const INPUT_NAME: &str = "sensorData";

/// Most recent value of every sensor channel, plus identity and time.
///
/// Owned by one bridge instance; only the bridge loop mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub device_id: String,
    /// Unix seconds of the last polled request (0 until the first poll).
    pub timestamp: i64,
    #[serde(rename = "inputName")]
    pub input_name: String,
    pub pressure: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
    pub proximity: f64,
}

impl SensorSnapshot {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_owned(),
            timestamp: 0,
            input_name: INPUT_NAME.to_owned(),
            pressure: 0.0,
            temperature: 0.0,
            humidity: 0.0,
            light: 0.0,
            proximity: 0.0,
        }
    }

    pub fn set(&mut self, channel: SensorChannel, value: f64) {
        match channel {
            SensorChannel::Temperature => self.temperature = value,
            SensorChannel::Humidity => self.humidity = value,
            SensorChannel::Light => self.light = value,
            SensorChannel::Proximity => self.proximity = value,
            SensorChannel::Pressure => self.pressure = value,
        }
    }

    pub fn get(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::Temperature => self.temperature,
            SensorChannel::Humidity => self.humidity,
            SensorChannel::Light => self.light,
            SensorChannel::Proximity => self.proximity,
            SensorChannel::Pressure => self.pressure,
        }
    }

    /// Fold one device sample into the snapshot.
    ///
    /// Returns `true` when the sample was a button press, i.e. the caller
    /// should raise its "ready to publish" flag.
    pub fn apply(&mut self, sample: DeviceSample) -> bool {
        match sample {
            DeviceSample::Reading { channel, value } => {
                self.set(channel, value);
                false
            }
            DeviceSample::ButtonPressed(button) => {
                let (channel, value) = button.preset();
                self.set(channel, value);
                true
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
