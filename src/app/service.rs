//! Decision service: the scheduling core.
//!
//! [`DecisionService`] gates the evaluations, pulls rows through the
//! [`SensorStore`] port, runs the pure evaluators and publishes the
//! resulting [`Decision`] through the [`BusPort`].  All I/O flows through
//! port traits injected at call sites, so the whole service runs against
//! mock adapters in tests.
//!
//! ```text
//!  SensorStore ──▶ ┌──────────────────────────┐ ──▶ BusPort
//!                  │     DecisionService      │
//!   TimePort   ──▶ │ cutoff · exposure · heat │ ──▶ EventSink
//!                  └──────────────────────────┘
//! ```
//!
//! A cycle either publishes exactly one decision or publishes nothing and
//! returns the error.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info};

use crate::config::SystemConfig;
use crate::decision::consensus::{
    all_present_and_above_threshold, decode_device_ids, decode_temperature_rows,
};
use crate::decision::exposure::{compute_daily_exposure, decode_light_rows};
use crate::decision::{Decision, light_decision};
use crate::error::{IntegrityError, Result};
use crate::sensors::SensorChannel;
use crate::store::StoreQuery;

use super::events::AppEvent;
use super::ports::{BusPort, ConfigError, EventSink, Qos, SensorStore};

/// Outcome of a light evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightGate {
    /// Local time was at or before the cutoff; nothing was queried.
    BeforeCutoff,
    /// The cutoff had passed and this decision was published.
    AfterCutoff(Decision),
}

impl LightGate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeCutoff => "before-cutoff",
            Self::AfterCutoff(_) => "after-cutoff",
        }
    }
}

/// Outcome of a windows evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsOutcome {
    pub open_windows: bool,
}

impl WindowsOutcome {
    pub fn decision(self) -> Decision {
        Decision::OpenWindows(self.open_windows)
    }

    pub fn status(self) -> &'static str {
        self.decision().status()
    }
}

pub struct DecisionService {
    tz: Tz,
    cutoff: NaiveTime,
    exposure_target_secs: u64,
    light_threshold: f64,
    temperature_threshold: f64,
    temperature_lookback: u32,
    topic: String,
    qos: Qos,
}

impl DecisionService {
    /// Build the service from configuration.
    ///
    /// Fails if the timezone is unknown, the cutoff hour is not a valid
    /// hour, or the QoS level is unsupported.
    pub fn new(config: &SystemConfig) -> core::result::Result<Self, ConfigError> {
        let tz = config
            .tz()
            .ok_or(ConfigError::ValidationFailed("timezone is not a known IANA zone"))?;
        let cutoff = NaiveTime::from_hms_opt(u32::from(config.light_cutoff_hour), 0, 0)
            .ok_or(ConfigError::ValidationFailed("light_cutoff_hour must be 0-23"))?;
        let qos = Qos::from_level(config.qos)
            .ok_or(ConfigError::ValidationFailed("qos must be 0 or 1"))?;

        Ok(Self {
            tz,
            cutoff,
            exposure_target_secs: u64::from(config.daily_exposure_target_secs),
            light_threshold: config.light_threshold,
            temperature_threshold: config.temperature_threshold_c,
            temperature_lookback: config.temperature_lookback_rows,
            topic: config.decision_topic.clone(),
            qos,
        })
    }

    // ── Light ─────────────────────────────────────────────────

    /// Evaluate today's sunlight exposure if the local cutoff has passed.
    ///
    /// The caller is expected to invoke this only while current light is
    /// below the sunlight threshold.
    pub fn evaluate_light(
        &self,
        now: DateTime<Utc>,
        store: &mut impl SensorStore,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<LightGate> {
        let local = now.with_timezone(&self.tz);
        if local.time() <= self.cutoff {
            debug!("Decision: {} is not after cutoff {}", local.time(), self.cutoff);
            sink.emit(&AppEvent::CutoffNotReached {
                local: local.time(),
            });
            return Ok(LightGate::BeforeCutoff);
        }

        let query = StoreQuery::LightAboveThreshold {
            threshold: self.light_threshold,
            since: self.local_midnight(now),
        };
        let rows = store.query(&query)?;
        let intervals = decode_light_rows(&rows)?;
        let total_secs = compute_daily_exposure(&intervals)?;
        info!(
            "Decision: {} s of sunlight today over {} intervals",
            total_secs,
            intervals.len()
        );
        sink.emit(&AppEvent::ExposureComputed { total_secs });

        let decision = light_decision(total_secs, self.exposure_target_secs);
        self.publish(decision, bus, sink)?;
        Ok(LightGate::AfterCutoff(decision))
    }

    /// Whether the latest light reading is at or below the sunlight
    /// threshold, the precondition for [`evaluate_light`](Self::evaluate_light).
    ///
    /// No light reading at all counts as dark.
    pub fn light_is_low(&self, store: &mut impl SensorStore) -> Result<bool> {
        let rows = store.query(&StoreQuery::Latest {
            channel: SensorChannel::Light,
        })?;
        let Some(row) = rows.first() else {
            return Ok(true);
        };
        let value = row
            .first()
            .and_then(Option::as_deref)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or(IntegrityError::MalformedRow {
                row: 0,
                reason: "unparseable light value",
            })?;
        Ok(value <= self.light_threshold)
    }

    /// Start of the local calendar day containing `now`, in UTC.
    pub fn local_midnight(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = now.with_timezone(&self.tz);
        let midnight = local.date_naive().and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight).earliest() {
            Some(t) => t.with_timezone(&Utc),
            // Midnight skipped by a DST jump: count back from the wall clock.
            None => now - local.time().signed_duration_since(NaiveTime::MIN),
        }
    }

    // ── Windows ───────────────────────────────────────────────

    /// Decide whether every node is hot enough to open the windows.
    /// Runs regardless of time of day.
    pub fn evaluate_windows(
        &self,
        store: &mut impl SensorStore,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<WindowsOutcome> {
        let id_rows = store.query(&StoreQuery::KnownDeviceIds)?;
        let temp_rows = store.query(&StoreQuery::RecentTemperatures {
            limit: self.temperature_lookback,
        })?;

        let known_ids = decode_device_ids(&id_rows)?;
        let records = decode_temperature_rows(&temp_rows)?;
        let open_windows =
            all_present_and_above_threshold(&records, &known_ids, self.temperature_threshold);
        debug!(
            "Decision: {} nodes, {} records, hot={}",
            known_ids.len(),
            records.len(),
            open_windows
        );

        let outcome = WindowsOutcome { open_windows };
        self.publish(outcome.decision(), bus, sink)?;
        Ok(outcome)
    }

    fn publish(
        &self,
        decision: Decision,
        bus: &mut impl BusPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let payload = decision.to_json()?;
        bus.publish(&self.topic, &payload, self.qos)?;
        info!("Decision: published {:?} ({})", decision, decision.status());
        sink.emit(&AppEvent::DecisionPublished(decision));
        Ok(())
    }
}
