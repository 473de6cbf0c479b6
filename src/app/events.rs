//! Outbound application events.
//!
//! The [`DecisionService`](super::service::DecisionService) and the
//! [`Bridge`](crate::bridge::Bridge) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log a line, feed the in-memory store,
//! record them in a test.

use chrono::NaiveTime;

use super::commands::DeviceCommand;
use crate::bridge::LinkState;
use crate::decision::Decision;
use crate::sensors::SensorSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The bridge link moved between states.
    LinkStateChanged { from: LinkState, to: LinkState },

    /// A sensor snapshot reached the bus.
    SnapshotPublished(SensorSnapshot),

    /// Light evaluation was skipped because the local cutoff has not passed.
    CutoffNotReached { local: NaiveTime },

    /// Today's exposure was aggregated.
    ExposureComputed { total_secs: u64 },

    /// A control decision reached the bus.
    DecisionPublished(Decision),

    /// An inbound state was rendered on the device.
    CommandApplied(DeviceCommand),

    /// An inbound state was not in the table.
    CommandIgnored(String),

    /// The bus came back after `attempts` reconnect tries.
    Reconnected { attempts: u32 },

    /// A publish cycle failed with a non-transport fault.
    CycleFailed(String),
}
