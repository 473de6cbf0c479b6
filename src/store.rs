//! Time-series store vocabulary: readings, named queries and row cells.
//!
//! The store itself sits behind [`SensorStore`](crate::app::ports::SensorStore).
//! Rows come back as vectors of nullable scalar strings, the shape a
//! Timestream-style `ScalarValue` response has, and are decoded by the
//! evaluators in [`crate::decision`].

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::sensors::SensorChannel;

/// Database and table every query targets.
pub const SENSOR_TABLE: &str = r#"sensor_data_db."sensor_data_table""#;

/// Timestamp layout of the `time` column (UTC, nanosecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// A nullable scalar cell.
pub type Cell = Option<String>;

/// One result row; column order is fixed per [`StoreQuery`] variant.
pub type Row = Vec<Cell>;

/// One measurement as it is ingested into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_id: String,
    pub measure_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// The named queries the evaluators issue.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreQuery {
    /// Light rows since `since` whose value exceeds `threshold`, each paired
    /// with the time of the next light row.
    ///
    /// Columns: `[value, time, next_time?]`, ascending by `time`.
    LightAboveThreshold {
        threshold: f64,
        since: DateTime<Utc>,
    },
    /// The `limit` latest temperature rows joined with the device id
    /// recorded at the same instant.
    ///
    /// Columns: `[measure_name, time, temperature, device_id]`.
    RecentTemperatures { limit: u32 },
    /// Every device id ever recorded.
    ///
    /// Columns: `[device_id]`.
    KnownDeviceIds,
    /// The most recent reading of one channel.
    ///
    /// Columns: `[value, time]`; no rows if the channel was never reported.
    Latest { channel: SensorChannel },
}

impl StoreQuery {
    /// Render the query text for a SQL-speaking store.
    pub fn expression(&self) -> String {
        match self {
            Self::LightAboveThreshold { threshold, since } => format!(
                "WITH light_rows AS (\n\
                 \x20   SELECT time, measure_value::double\n\
                 \x20   FROM {SENSOR_TABLE}\n\
                 \x20   WHERE measure_name = 'light'\n\
                 \x20       AND time >= '{since}'\n\
                 ),\n\
                 all_rows AS (\n\
                 \x20   SELECT measure_value::double, time,\n\
                 \x20       LEAD(time) OVER (ORDER BY time ASC) AS next_time\n\
                 \x20   FROM light_rows\n\
                 )\n\
                 SELECT measure_value::double, time, next_time\n\
                 FROM all_rows\n\
                 WHERE measure_value::double > {threshold}",
                since = format_timestamp(*since),
            ),
            Self::RecentTemperatures { limit } => format!(
                "SELECT t1.measure_name, t1.time, t1.measure_value::double AS temperature, \
                 t2.measure_value::varchar AS device_id\n\
                 FROM (\n\
                 \x20   SELECT measure_name, time, measure_value::double\n\
                 \x20   FROM {SENSOR_TABLE}\n\
                 \x20   WHERE measure_name = 'temperature'\n\
                 \x20   ORDER BY time DESC\n\
                 \x20   LIMIT {limit}\n\
                 ) AS t1\n\
                 JOIN (\n\
                 \x20   SELECT measure_name, time, measure_value::varchar\n\
                 \x20   FROM {SENSOR_TABLE}\n\
                 \x20   WHERE measure_name = 'device_id'\n\
                 ) AS t2 ON t1.time = t2.time"
            ),
            Self::KnownDeviceIds => format!(
                "SELECT DISTINCT measure_value::varchar\n\
                 FROM {SENSOR_TABLE}\n\
                 WHERE measure_name = 'device_id'"
            ),
            Self::Latest { channel } => format!(
                "SELECT measure_value::double, time\n\
                 FROM {SENSOR_TABLE}\n\
                 WHERE measure_name = '{measure}'\n\
                 ORDER BY time DESC\n\
                 LIMIT 1",
                measure = channel.measure_name(),
            ),
        }
    }
}

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `time` cell.  Accepts any number of fractional digits.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|t| t.and_utc())
}
