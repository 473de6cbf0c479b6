//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DecisionService / Bridge (domain)
//! ```
//!
//! Driven adapters (sensor store, message bus, device link, event sinks,
//! configuration, clock) implement these traits.  The domain consumes them
//! via generics, so the core never touches a network socket or a serial
//! port directly.
//!
//! All port errors are typed: callers must handle every variant explicitly.

use chrono::{DateTime, Utc};

use crate::config::SystemConfig;
use crate::drivers::status_led::Rgb;
use crate::sensors::{SampleSender, SensorChannel};
use crate::store::{Row, StoreQuery};

// ───────────────────────────────────────────────────────────────
// Sensor store (driven adapter: time-series database → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port onto the time-series store.
///
/// Each named [`StoreQuery`] returns rows of scalar cells in the fixed
/// column order documented on the query variant.
pub trait SensorStore {
    fn query(&mut self, query: &StoreQuery) -> Result<Vec<Row>, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Message bus (driven adapter: domain ↔ broker)
// ───────────────────────────────────────────────────────────────

/// Delivery guarantee requested for a publish or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
}

impl Qos {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::AtMostOnce),
            1 => Some(Self::AtLeastOnce),
            _ => None,
        }
    }
}

/// A message received on one of the subscribed topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Pub/sub transport.
pub trait BusPort {
    /// Open the broker connection.
    fn connect(&mut self) -> Result<(), BusError>;

    /// Publish `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BusError>;

    /// Subscribe to every topic in `topics`.  Implementations must keep the
    /// subscriptions alive across reconnects.
    fn subscribe(&mut self, topics: &[String], qos: Qos) -> Result<(), BusError>;

    /// Re-establish a lost connection.
    fn reconnect(&mut self) -> Result<(), BusError>;

    /// Next inbound message, if one is pending.  Never blocks.
    fn try_recv(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Device link (driven adapter: domain ↔ attached hardware)
// ───────────────────────────────────────────────────────────────

/// The attached sensor/display device.
///
/// Sensor readings and button presses are delivered asynchronously through
/// the [`SampleSender`] handed over in [`open`](DevicePort::open); the
/// device never writes bridge state directly.
pub trait DevicePort {
    /// Open the link and register the sample callback channel.
    fn open(&mut self, samples: SampleSender) -> Result<(), DeviceError>;

    /// Ask the device to report one sensor channel.
    fn request(&mut self, channel: SensorChannel) -> Result<(), DeviceError>;

    /// Set the RGB LED colour.
    fn set_led(&mut self, rgb: Rgb) -> Result<(), DeviceError>;

    /// Replace the display contents.
    fn set_display(&mut self, text: &str) -> Result<(), DeviceError>;

    /// Stop the device link and release the underlying resource.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / ingestion)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting and
/// after loading.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.
pub trait TimePort {
    fn now(&self) -> DateTime<Utc>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the evaluations)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Scheduler`](crate::scheduler::Scheduler)
/// invokes when a schedule fires.
pub trait SchedulerDelegate {
    /// * `label`: the human-readable label of the schedule that fired.
    /// * `kind` : whether it was a periodic or one-shot fire.
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    Periodic,
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SensorStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    Unavailable(String),
    /// The store rejected the query.
    QueryFailed(String),
}

/// Errors from [`BusPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Connection-level fault (EOF, TLS, not connected).  Recoverable by
    /// reconnecting.
    Transport(String),
    /// The broker or client refused the request.
    Rejected(String),
}

/// Errors from [`DevicePort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The link has not been opened or was already stopped.
    NotOpen,
    /// Underlying I/O failure.
    Io(String),
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage.
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            Self::QueryFailed(msg) => write!(f, "query failed: {}", msg),
        }
    }
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport fault: {}", msg),
            Self::Rejected(msg) => write!(f, "rejected: {}", msg),
        }
    }
}

impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotOpen => write!(f, "device link not open"),
            Self::Io(msg) => write!(f, "device I/O: {}", msg),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StoreError {}
impl std::error::Error for BusError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for ConfigError {}
