//! In-process sensor store.
//!
//! Implements [`SensorStore`] over a vector of ingested [`Reading`]s,
//! answering every [`StoreQuery`] with the same columns a Timestream
//! backend returns.  [`StoreIngestSink`] feeds it from published
//! snapshots, so a single process can run the full loop:
//!
//! ```text
//!  Bridge ──SnapshotPublished──▶ StoreIngestSink ──▶ MemoryStore ◀── DecisionService
//! ```
//!
//! Readings older than the retention window (measured from the newest
//! ingested timestamp) are dropped on ingest.  Device ids are tracked
//! separately and never expire.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorStore, StoreError, TimePort};
use crate::sensors::{SensorChannel, SensorSnapshot};
use crate::store::{Reading, Row, StoreQuery, format_timestamp};

const DEVICE_ID_MEASURE: &str = "device_id";

/// Channels a snapshot contributes as separate readings.
const SNAPSHOT_CHANNELS: [SensorChannel; 5] = [
    SensorChannel::Pressure,
    SensorChannel::Temperature,
    SensorChannel::Humidity,
    SensorChannel::Light,
    SensorChannel::Proximity,
];

/// Covers the longest local day plus the previous evening.
pub const DEFAULT_RETENTION_HOURS: i64 = 48;

#[derive(Debug)]
pub struct MemoryStore {
    /// Ingestion order.
    readings: VecDeque<Reading>,
    /// Distinct device ids, first seen first.
    device_ids: Vec<String>,
    retention: Duration,
    newest: Option<DateTime<Utc>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_retention(Duration::hours(DEFAULT_RETENTION_HOURS))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            readings: VecDeque::new(),
            device_ids: Vec::new(),
            retention,
            newest: None,
        }
    }

    pub fn ingest(&mut self, reading: Reading) {
        if !self.device_ids.contains(&reading.device_id) {
            self.device_ids.push(reading.device_id.clone());
        }
        let newest = self
            .newest
            .map_or(reading.timestamp, |n| n.max(reading.timestamp));
        self.newest = Some(newest);
        self.readings.push_back(reading);
        self.prune(newest - self.retention);
    }

    /// Pop expired readings off the front.  A late reading that arrived
    /// out of order goes once it reaches the front.
    fn prune(&mut self, cutoff: DateTime<Utc>) {
        let mut dropped = 0usize;
        while self.readings.front().is_some_and(|r| r.timestamp < cutoff) {
            self.readings.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            debug!("MemoryStore: pruned {} readings before {}", dropped, cutoff);
        }
    }

    /// Record every channel of `snapshot` at `at`, plus a `device_id`
    /// marker row the temperature query joins on.
    pub fn ingest_snapshot(&mut self, snapshot: &SensorSnapshot, at: DateTime<Utc>) {
        for channel in SNAPSHOT_CHANNELS {
            self.ingest(Reading {
                device_id: snapshot.device_id.clone(),
                measure_name: channel.measure_name().to_owned(),
                value: snapshot.get(channel),
                timestamp: at,
            });
        }
        self.ingest(Reading {
            device_id: snapshot.device_id.clone(),
            measure_name: DEVICE_ID_MEASURE.to_owned(),
            value: 0.0,
            timestamp: at,
        });
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings of one measure, ascending by time.
    fn measure(&self, name: &str) -> Vec<&Reading> {
        let mut rows: Vec<&Reading> = self
            .readings
            .iter()
            .filter(|r| r.measure_name == name)
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        rows
    }

    fn light_above(&self, threshold: f64, since: DateTime<Utc>) -> Vec<Row> {
        let light: Vec<&Reading> = self
            .measure(SensorChannel::Light.measure_name())
            .into_iter()
            .filter(|r| r.timestamp >= since)
            .collect();

        light
            .iter()
            .enumerate()
            .filter(|(_, r)| r.value > threshold)
            .map(|(i, r)| {
                vec![
                    Some(r.value.to_string()),
                    Some(format_timestamp(r.timestamp)),
                    light.get(i + 1).map(|next| format_timestamp(next.timestamp)),
                ]
            })
            .collect()
    }

    fn recent_temperatures(&self, limit: u32) -> Vec<Row> {
        let ids = self.measure(DEVICE_ID_MEASURE);
        self.measure(SensorChannel::Temperature.measure_name())
            .into_iter()
            .rev()
            .take(limit as usize)
            .flat_map(|t| {
                ids.iter()
                    .filter(move |id| id.timestamp == t.timestamp)
                    .map(move |id| {
                        vec![
                            Some(t.measure_name.clone()),
                            Some(format_timestamp(t.timestamp)),
                            Some(t.value.to_string()),
                            Some(id.device_id.clone()),
                        ]
                    })
            })
            .collect()
    }

    fn known_device_ids(&self) -> Vec<Row> {
        self.device_ids
            .iter()
            .map(|id| vec![Some(id.clone())])
            .collect()
    }

    fn latest(&self, channel: SensorChannel) -> Vec<Row> {
        self.measure(channel.measure_name())
            .last()
            .map(|r| {
                vec![vec![
                    Some(r.value.to_string()),
                    Some(format_timestamp(r.timestamp)),
                ]]
            })
            .unwrap_or_default()
    }
}

impl SensorStore for MemoryStore {
    fn query(&mut self, query: &StoreQuery) -> Result<Vec<Row>, StoreError> {
        let rows = match query {
            StoreQuery::LightAboveThreshold { threshold, since } => {
                self.light_above(*threshold, *since)
            }
            StoreQuery::RecentTemperatures { limit } => self.recent_temperatures(*limit),
            StoreQuery::KnownDeviceIds => self.known_device_ids(),
            StoreQuery::Latest { channel } => self.latest(*channel),
        };
        debug!("MemoryStore: {:?} -> {} rows", query, rows.len());
        Ok(rows)
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handle
// ───────────────────────────────────────────────────────────────

/// Cloneable handle so the bridge thread can ingest while the evaluation
/// thread queries.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, MemoryStore>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl SensorStore for SharedStore {
    fn query(&mut self, query: &StoreQuery) -> Result<Vec<Row>, StoreError> {
        self.lock()?.query(query)
    }
}

/// [`EventSink`] that writes every published snapshot into a store.
pub struct StoreIngestSink<C> {
    store: SharedStore,
    clock: C,
}

impl<C: TimePort> StoreIngestSink<C> {
    pub fn new(store: SharedStore, clock: C) -> Self {
        Self { store, clock }
    }
}

impl<C: TimePort> EventSink for StoreIngestSink<C> {
    fn emit(&mut self, event: &AppEvent) {
        let AppEvent::SnapshotPublished(snapshot) = event else {
            return;
        };
        match self.store.lock() {
            Ok(mut store) => store.ingest_snapshot(snapshot, self.clock.now()),
            Err(e) => warn!("MemoryStore: dropping snapshot: {}", e),
        }
    }
}
