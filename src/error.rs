//! Unified error types for the plant-care engine.
//!
//! A single [`Error`] enum that every subsystem converts into, keeping the
//! scheduler's and the bridge's error handling uniform.  Port-level errors
//! (store, bus, device, config) are defined next to their traits in
//! [`crate::app::ports`]; data-integrity faults live here because both
//! evaluators raise them.

use core::fmt;

use chrono::{DateTime, Utc};

use crate::app::ports::{BusError, ConfigError, DeviceError, StoreError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the engine funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// Evaluator input was malformed or out of order.
    Integrity(IntegrityError),
    /// The sensor store could not answer a query.
    Store(StoreError),
    /// The message bus rejected or lost a publish.
    Bus(BusError),
    /// The device link failed.
    Device(DeviceError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A payload could not be encoded for the wire.
    Encode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrity(e) => write!(f, "integrity: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Encode(msg) => write!(f, "encode: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Transport faults are recovered by reconnecting; everything else is
    /// logged and the cycle is abandoned.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Bus(BusError::Transport(_)))
    }
}

// ---------------------------------------------------------------------------
// Data-integrity faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// An exposure interval ends before it starts.
    NegativeInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// A store row is missing a required cell or a cell failed to parse.
    MalformedRow { row: usize, reason: &'static str },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeInterval { start, end } => {
                write!(f, "interval ends before it starts ({start} > {end})")
            }
            Self::MalformedRow { row, reason } => write!(f, "row {row}: {reason}"),
        }
    }
}

impl std::error::Error for IntegrityError {}

impl From<IntegrityError> for Error {
    fn from(e: IntegrityError) -> Self {
        Self::Integrity(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
