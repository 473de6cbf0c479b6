//! Simulated device adapter.
//!
//! Implements [`DevicePort`] on the host: sensor requests are answered at
//! once with synthetic values that drift around a plausible greenhouse
//! climate, LED and display writes are kept and logged.  Button presses
//! come from a [`ButtonPanel`] handle (the binary wires it to stdin).

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::app::ports::{DeviceError, DevicePort};
use crate::drivers::button::Button;
use crate::drivers::status_led::{Rgb, StatusLed};
use crate::sensors::{SampleSender, SensorChannel};

type SenderSlot = Arc<Mutex<Option<SampleSender>>>;

pub struct SimDevice {
    link: SenderSlot,
    led: StatusLed,
    display: String,
    requests: u32,
}

impl SimDevice {
    pub fn new() -> Self {
        Self {
            link: Arc::new(Mutex::new(None)),
            led: StatusLed::new(),
            display: String::new(),
            requests: 0,
        }
    }

    /// Handle for injecting button presses from another thread.
    pub fn buttons(&self) -> ButtonPanel {
        ButtonPanel {
            link: self.link.clone(),
        }
    }

    pub fn led_colour(&self) -> Rgb {
        self.led.current_colour()
    }

    pub fn display_text(&self) -> &str {
        &self.display
    }

    fn sender(&self) -> Result<SampleSender, DeviceError> {
        self.link
            .lock()
            .map_err(|_| DeviceError::Io("link lock poisoned".into()))?
            .clone()
            .ok_or(DeviceError::NotOpen)
    }

    /// Deterministic pseudo-reading: a slow triangle wave around `base`.
    fn synthetic(&self, channel: SensorChannel) -> f64 {
        let phase = f64::from(self.requests % 20);
        let wave = (if phase < 10.0 { phase } else { 20.0 - phase }) / 10.0;
        match channel {
            SensorChannel::Temperature => 20.0 + 8.0 * wave,
            SensorChannel::Humidity => 35.0 + 20.0 * wave,
            SensorChannel::Light => 30.0 + 100.0 * wave,
            SensorChannel::Proximity => 0.0,
            SensorChannel::Pressure => 1013.0,
        }
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicePort for SimDevice {
    fn open(&mut self, samples: SampleSender) -> Result<(), DeviceError> {
        *self
            .link
            .lock()
            .map_err(|_| DeviceError::Io("link lock poisoned".into()))? = Some(samples);
        info!("SimDevice: link open");
        Ok(())
    }

    fn request(&mut self, channel: SensorChannel) -> Result<(), DeviceError> {
        let sender = self.sender()?;
        self.requests = self.requests.wrapping_add(1);
        let value = self.synthetic(channel);
        debug!("SimDevice: {} = {:.1}", channel.measure_name(), value);
        sender.reading(channel, value);
        Ok(())
    }

    fn set_led(&mut self, rgb: Rgb) -> Result<(), DeviceError> {
        self.sender()?;
        self.led.set_colour(rgb);
        info!("SimDevice: LED {:?}", rgb);
        Ok(())
    }

    fn set_display(&mut self, text: &str) -> Result<(), DeviceError> {
        self.sender()?;
        self.display = text.to_owned();
        info!("SimDevice: display\n{}", text);
        Ok(())
    }

    fn stop(&mut self) {
        match self.link.lock() {
            Ok(mut link) => *link = None,
            Err(_) => warn!("SimDevice: link lock poisoned on stop"),
        }
        self.led.off();
        info!("SimDevice: link closed");
    }
}

/// Cloneable front panel of a [`SimDevice`].
#[derive(Clone)]
pub struct ButtonPanel {
    link: SenderSlot,
}

impl ButtonPanel {
    /// Press `button`.  Returns `false` if the link is closed or the
    /// sample queue is full.
    pub fn press(&self, button: Button) -> bool {
        let Ok(link) = self.link.lock() else {
            return false;
        };
        match link.as_ref() {
            Some(sender) => {
                info!("SimDevice: button {:?} pressed", button);
                sender.button(button)
            }
            None => {
                debug!("SimDevice: button {:?} ignored, link closed", button);
                false
            }
        }
    }
}
