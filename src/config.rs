//! System configuration parameters
//!
//! All tunable parameters for the plant-care rig.
//! Values can be overridden from a JSON file via
//! [`FileConfigAdapter`](crate::adapters::config_file::FileConfigAdapter).

use core::time::Duration;
use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// How the bridge decides when to publish a sensor snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundMode {
    /// Request every sensor channel on a fixed cadence and publish.
    Polled,
    /// Publish only after a button press injected a preset value.
    Button,
}

/// Client certificate material for a mutually authenticated broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsFiles {
    pub ca_path: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Identity ---
    /// Identifier stamped into every published snapshot
    pub device_id: String,

    // --- Light decision ---
    /// IANA timezone the cutoff hour is evaluated in
    pub timezone: String,
    /// Local hour after which the daily exposure is evaluated (0-23)
    pub light_cutoff_hour: u8,
    /// Daily exposure target in seconds
    pub daily_exposure_target_secs: u32,
    /// Light level that counts as sunlight
    pub light_threshold: f64,

    // --- Windows decision ---
    /// Temperature (Celsius) every node must exceed before windows open
    pub temperature_threshold_c: f64,
    /// Number of latest temperature rows considered
    pub temperature_lookback_rows: u32,

    // --- Bus ---
    /// Topic decisions and snapshots are published on
    pub decision_topic: String,
    /// Topics carrying actuator state for the device display
    pub command_topics: Vec<String>,
    /// QoS level for publishes and subscriptions (0 or 1)
    pub qos: u8,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    /// MQTT keep-alive (seconds)
    pub keep_alive_secs: u16,
    /// Client certificates; plain TCP when absent
    pub tls: Option<TlsFiles>,

    // --- Bridge timing ---
    pub outbound_mode: OutboundMode,
    /// Time allowed for the device to answer sensor requests (milliseconds)
    pub sample_collect_ms: u32,
    /// Pause between polled publishes (milliseconds)
    pub publish_interval_ms: u32,
    /// Ready-flag poll interval in button mode (milliseconds)
    pub trigger_poll_ms: u32,
    /// First reconnect delay (milliseconds)
    pub reconnect_initial_ms: u32,
    /// Reconnect delay ceiling (milliseconds)
    pub reconnect_max_ms: u32,

    // --- Evaluation cadence ---
    /// Light evaluation interval (seconds)
    pub light_eval_interval_secs: u32,
    /// Windows evaluation interval (seconds)
    pub windows_eval_interval_secs: u32,

    // --- In-process store ---
    /// Readings older than this (hours) are pruned on ingest
    pub store_retention_hours: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            device_id: "002".into(),

            timezone: "Europe/Berlin".into(),
            light_cutoff_hour: 18,
            daily_exposure_target_secs: 28_800, // 8 h
            light_threshold: 60.0,

            temperature_threshold_c: 25.0,
            temperature_lookback_rows: 5,

            decision_topic: "iot/sensor_data".into(),
            command_topics: vec!["iot/actor_data".into(), "iot/error".into()],
            qos: 1,
            broker_host: "localhost".into(),
            broker_port: 8883,
            client_id: "plantcare-002".into(),
            keep_alive_secs: 120,
            tls: None,

            outbound_mode: OutboundMode::Button,
            sample_collect_ms: 1000,
            publish_interval_ms: 4000,
            trigger_poll_ms: 1000,
            reconnect_initial_ms: 2000,
            reconnect_max_ms: 60_000,

            light_eval_interval_secs: 300,
            windows_eval_interval_secs: 300,

            store_retention_hours: 48,
        }
    }
}

impl SystemConfig {
    /// Parsed timezone, `None` if the name is not a known IANA zone.
    pub fn tz(&self) -> Option<Tz> {
        self.timezone.parse().ok()
    }

    pub fn sample_collect(&self) -> Duration {
        Duration::from_millis(self.sample_collect_ms as u64)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms as u64)
    }

    pub fn trigger_poll(&self) -> Duration {
        Duration::from_millis(self.trigger_poll_ms as u64)
    }

    pub fn store_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.store_retention_hours))
    }
}
