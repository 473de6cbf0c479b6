//! Actuation bridge: the long-running device ↔ bus loop.
//!
//! ```text
//!             DeviceSample (bounded)          snapshot JSON
//!  DevicePort ─────────────────────▶ Bridge ─────────────────▶ BusPort
//!      ▲                              │  ▲                        │
//!      │   LED + rendered history     │  │  {"state": ...}        │
//!      └──────────────────────────────┘  └────────────────────────┘
//! ```
//!
//! Link states:
//!
//! ```text
//!  Disconnected ──start──▶ Connected ──subscribed──▶ Streaming
//!       ▲                                               │
//!       └──────────── transport fault / shutdown ───────┘
//! ```
//!
//! The bridge is the only owner of the [`SensorSnapshot`], the ready flag
//! and the [`DisplayHistory`]; device callbacks reach it only through the
//! sample channel.

pub mod backoff;
pub mod shutdown;

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::app::commands::{DeviceCommand, parse_state};
use crate::app::events::AppEvent;
use crate::app::ports::{
    BusPort, ConfigError, DevicePort, EventSink, InboundMessage, Qos, TimePort,
};
use crate::config::{OutboundMode, SystemConfig};
use crate::drivers::display::DisplayHistory;
use crate::error::Result;
use crate::sensors::{SampleReceiver, SampleSender, SensorChannel, SensorSnapshot, sample_channel};

pub use backoff::Backoff;
pub use shutdown::ShutdownHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    Streaming,
}

pub struct Bridge<D, B, S, C> {
    device: D,
    bus: B,
    sink: S,
    clock: C,

    sample_tx: SampleSender,
    samples: SampleReceiver,
    snapshot: SensorSnapshot,
    ready: bool,
    display: DisplayHistory,
    state: LinkState,
    backoff: Backoff,
    shutdown: ShutdownHandle,

    mode: OutboundMode,
    topic: String,
    command_topics: Vec<String>,
    qos: Qos,
    collect_window: Duration,
    publish_interval: Duration,
    trigger_poll: Duration,
}

impl<D, B, S, C> Bridge<D, B, S, C>
where
    D: DevicePort,
    B: BusPort,
    S: EventSink,
    C: TimePort,
{
    pub fn new(
        config: &SystemConfig,
        device: D,
        bus: B,
        sink: S,
        clock: C,
    ) -> core::result::Result<Self, ConfigError> {
        let qos = Qos::from_level(config.qos)
            .ok_or(ConfigError::ValidationFailed("qos must be 0 or 1"))?;
        let (sample_tx, samples) = sample_channel();
        Ok(Self {
            device,
            bus,
            sink,
            clock,
            sample_tx,
            samples,
            snapshot: SensorSnapshot::new(&config.device_id),
            ready: false,
            display: DisplayHistory::new(),
            state: LinkState::Disconnected,
            backoff: Backoff::new(
                Duration::from_millis(u64::from(config.reconnect_initial_ms)),
                Duration::from_millis(u64::from(config.reconnect_max_ms)),
            ),
            shutdown: ShutdownHandle::new(),
            mode: config.outbound_mode,
            topic: config.decision_topic.clone(),
            command_topics: config.command_topics.clone(),
            qos,
            collect_window: config.sample_collect(),
            publish_interval: config.publish_interval(),
            trigger_poll: config.trigger_poll(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open the device link, connect the bus and subscribe to the command
    /// topics.  Ends in [`LinkState::Streaming`].
    pub fn start(&mut self) -> Result<()> {
        self.device.open(self.sample_tx.clone())?;
        self.bus.connect()?;
        self.set_state(LinkState::Connected);
        self.bus.subscribe(&self.command_topics, self.qos)?;
        info!("Bridge: subscribed to {:?}", self.command_topics);
        self.set_state(LinkState::Streaming);
        Ok(())
    }

    /// Run until the shutdown handle is triggered.  The device link is
    /// stopped on every exit path.
    pub fn run(&mut self) -> Result<()> {
        if let Err(e) = self.start() {
            error!("Bridge: start failed: {}", e);
            self.stop();
            return Err(e);
        }
        info!("Bridge: streaming in {:?} mode", self.mode);

        while !self.shutdown.is_triggered() {
            let result = self.cycle();
            self.handle_cycle_result(result);
            let pause = match self.mode {
                OutboundMode::Polled => self.publish_interval,
                OutboundMode::Button => self.trigger_poll,
            };
            self.idle(pause);
        }

        self.stop();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.device.stop();
        self.set_state(LinkState::Disconnected);
        info!("Bridge: stopped");
    }

    // ── One cycle ─────────────────────────────────────────────

    /// One outbound cycle plus inbound dispatch.
    ///
    /// * Polled: request every channel, stamp the time, wait the collect
    ///   window, publish.
    /// * Button: publish only if a button press raised the ready flag; the
    ///   flag is cleared only once the publish succeeded.
    pub fn cycle(&mut self) -> Result<()> {
        match self.mode {
            OutboundMode::Polled => {
                for channel in SensorChannel::POLLED {
                    self.device.request(channel)?;
                }
                self.snapshot.timestamp = self.clock.now().timestamp();
                self.idle(self.collect_window);
                self.drain_samples();
                self.drain_inbound();
                self.publish_snapshot()?;
            }
            OutboundMode::Button => {
                self.drain_samples();
                self.drain_inbound();
                if self.ready {
                    self.publish_snapshot()?;
                    self.ready = false;
                }
            }
        }
        Ok(())
    }

    fn handle_cycle_result(&mut self, result: Result<()>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_transport() => {
                warn!("Bridge: {}, reconnecting", e);
                self.recover();
            }
            Err(e) => {
                error!("Bridge: cycle failed: {}", e);
                self.sink.emit(&AppEvent::CycleFailed(e.to_string()));
            }
        }
    }

    /// Reconnect with exponential backoff until it works or shutdown.
    pub fn recover(&mut self) {
        self.set_state(LinkState::Disconnected);
        let mut attempt: u32 = 0;
        while !self.shutdown.is_triggered() {
            attempt += 1;
            let delay = self.backoff.next_delay();
            info!("Bridge: reconnect attempt {} (backoff {:?})", attempt, delay);
            if !self.shutdown.sleep(delay) {
                return;
            }
            match self.bus.reconnect() {
                Ok(()) => {
                    self.backoff.reset();
                    self.set_state(LinkState::Connected);
                    self.set_state(LinkState::Streaming);
                    self.sink.emit(&AppEvent::Reconnected { attempts: attempt });
                    return;
                }
                Err(e) => warn!("Bridge: reconnect failed: {}", e),
            }
        }
    }

    fn publish_snapshot(&mut self) -> Result<()> {
        let payload = self.snapshot.to_json()?;
        self.bus.publish(&self.topic, &payload, self.qos)?;
        debug!("Bridge: published snapshot ts={}", self.snapshot.timestamp);
        self.sink
            .emit(&AppEvent::SnapshotPublished(self.snapshot.clone()));
        Ok(())
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Wait out `pause`, dispatching commands as they arrive.  Returns
    /// `false` if shutdown cut the wait short.
    pub fn idle(&mut self, pause: Duration) -> bool {
        let shutdown = self.shutdown.clone();
        shutdown.sleep_with(pause, || self.drain_inbound())
    }

    /// Apply pending samples.  Button presses raise the ready flag only in
    /// button mode; polled mode publishes on its own cadence.
    fn drain_samples(&mut self) {
        while let Some(sample) = self.samples.try_recv() {
            if self.snapshot.apply(sample) && self.mode == OutboundMode::Button {
                self.ready = true;
            }
        }
    }

    fn drain_inbound(&mut self) {
        while let Some(message) = self.bus.try_recv() {
            self.dispatch(&message);
        }
    }

    /// Render one command message on the device.
    ///
    /// Returns the command applied, `None` if the payload was undecodable
    /// or the state unknown (both leave the device untouched).
    pub fn dispatch(&mut self, message: &InboundMessage) -> Option<DeviceCommand> {
        let state = match parse_state(&message.payload) {
            Ok(state) => state,
            Err(e) => {
                warn!("Bridge: undecodable message on {}: {}", message.topic, e);
                return None;
            }
        };
        let Some(command) = DeviceCommand::from_state(&state) else {
            debug!("Bridge: ignoring unknown state '{}'", state);
            self.sink.emit(&AppEvent::CommandIgnored(state));
            return None;
        };

        if let Err(e) = self.device.set_led(command.rgb()) {
            error!("Bridge: LED update failed: {}", e);
        }
        let rendered = self.display.append(command.text());
        if let Err(e) = self.device.set_display(&rendered) {
            error!("Bridge: display update failed: {}", e);
        }
        info!("Bridge: applied {}", command.state());
        self.sink.emit(&AppEvent::CommandApplied(command));
        Some(command)
    }

    fn set_state(&mut self, to: LinkState) {
        let from = self.state;
        if from != to {
            self.state = to;
            self.sink.emit(&AppEvent::LinkStateChanged { from, to });
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn display(&self) -> &DisplayHistory {
        &self.display
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
