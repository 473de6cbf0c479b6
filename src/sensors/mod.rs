//! Sensor sample delivery from the device link to the bridge loop.
//!
//! Device callbacks run on whatever thread the driver owns.  They never
//! touch bridge state: each reading or button press is sent as an
//! immutable [`DeviceSample`] over a bounded `embassy-sync` channel and
//! the bridge loop, the single owner of the [`SensorSnapshot`], applies
//! them in arrival order.
//!
//! ```text
//! ┌──────────────┐  DeviceSample  ┌──────────────┐
//! │ Device link  │───────────────▶│ Bridge loop  │
//! │ (callbacks)  │   (bounded)    │ (owner)      │
//! └──────────────┘                └──────────────┘
//! ```

pub mod snapshot;

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::drivers::button::Button;

pub use snapshot::SensorSnapshot;

/// Maximum number of undelivered samples.
const SAMPLE_QUEUE_DEPTH: usize = 32;

type SampleChannel = Channel<CriticalSectionRawMutex, DeviceSample, SAMPLE_QUEUE_DEPTH>;

/// Sensor channels the device can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    Temperature,
    Humidity,
    Light,
    Proximity,
    Pressure,
}

impl SensorChannel {
    /// Channels requested on every polled cycle.
    pub const POLLED: [SensorChannel; 4] = [
        SensorChannel::Temperature,
        SensorChannel::Humidity,
        SensorChannel::Light,
        SensorChannel::Proximity,
    ];

    /// Measure name used on the wire and in the store.
    pub fn measure_name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Proximity => "proximity",
            Self::Pressure => "pressure",
        }
    }
}

/// One message from the device link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceSample {
    /// A sensor reported a value.
    Reading { channel: SensorChannel, value: f64 },
    /// A front-panel button was pressed.
    ButtonPressed(Button),
}

/// Producer half handed to the device driver.
#[derive(Clone)]
pub struct SampleSender {
    channel: Arc<SampleChannel>,
}

impl SampleSender {
    /// Queue a sample.  Returns `false` if the queue is full (sample dropped).
    pub fn send(&self, sample: DeviceSample) -> bool {
        if self.channel.try_send(sample).is_err() {
            warn!("Samples: queue full, dropping {:?}", sample);
            return false;
        }
        true
    }

    pub fn reading(&self, channel: SensorChannel, value: f64) -> bool {
        self.send(DeviceSample::Reading { channel, value })
    }

    pub fn button(&self, button: Button) -> bool {
        self.send(DeviceSample::ButtonPressed(button))
    }
}

/// Consumer half owned by the bridge loop.
pub struct SampleReceiver {
    channel: Arc<SampleChannel>,
}

impl SampleReceiver {
    /// Pop the next sample, `None` if the queue is empty.
    pub fn try_recv(&self) -> Option<DeviceSample> {
        self.channel.try_receive().ok()
    }
}

/// Create a connected sender/receiver pair.
pub fn sample_channel() -> (SampleSender, SampleReceiver) {
    let channel = Arc::new(SampleChannel::new());
    (
        SampleSender {
            channel: channel.clone(),
        },
        SampleReceiver { channel },
    )
}
