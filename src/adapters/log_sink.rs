//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event as one
//! tagged log line through the `log` facade.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::LinkStateChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            AppEvent::SnapshotPublished(s) => {
                info!(
                    "SNAP  | dev={} ts={} | T={:.1}\u{00b0}C H={:.1}% L={:.0} P={:.0} prox={:.0}",
                    s.device_id, s.timestamp, s.temperature, s.humidity, s.light, s.pressure, s.proximity,
                );
            }
            AppEvent::CutoffNotReached { local } => {
                debug!("LIGHT | before cutoff (local {})", local.format("%H:%M:%S"));
            }
            AppEvent::ExposureComputed { total_secs } => {
                info!(
                    "LIGHT | exposure today {}s ({:.1}h)",
                    total_secs,
                    *total_secs as f64 / 3600.0
                );
            }
            AppEvent::DecisionPublished(d) => {
                info!("DECIDE| {:?} -> {}", d, d.status());
            }
            AppEvent::CommandApplied(c) => {
                info!("CMD   | {} rgb={:?}", c.state(), c.rgb());
            }
            AppEvent::CommandIgnored(state) => {
                debug!("CMD   | ignored '{}'", state);
            }
            AppEvent::Reconnected { attempts } => {
                info!("LINK  | reconnected after {} attempt(s)", attempts);
            }
            AppEvent::CycleFailed(reason) => {
                warn!("CYCLE | failed: {}", reason);
            }
        }
    }
}
