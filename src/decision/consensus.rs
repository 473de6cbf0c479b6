//! Multi-node temperature consensus.
//!
//! Windows open only when every known sensor node agrees it is hot: each
//! node must appear in the recent temperature rows with at least one
//! reading strictly above the threshold.  A node that has gone quiet
//! blocks the decision.

use chrono::{DateTime, Utc};

use crate::error::IntegrityError;
use crate::store::{Row, parse_timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTemperatureRecord {
    pub device_id: String,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// Decode `[measure_name, time, temperature, device_id]` rows.
pub fn decode_temperature_rows(
    rows: &[Row],
) -> Result<Vec<DeviceTemperatureRecord>, IntegrityError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let malformed = |reason| IntegrityError::MalformedRow { row: i, reason };
            let cell = |idx: usize, reason| {
                row.get(idx)
                    .and_then(Option::as_deref)
                    .ok_or(malformed(reason))
            };

            let timestamp = parse_timestamp(cell(1, "missing time")?)
                .ok_or(malformed("unparseable time"))?;
            let temperature = cell(2, "missing temperature")?
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed("unparseable temperature"))?;
            let device_id = cell(3, "missing device id")?.to_owned();

            Ok(DeviceTemperatureRecord {
                device_id,
                temperature,
                timestamp,
            })
        })
        .collect()
}

/// Decode `[device_id]` rows.
pub fn decode_device_ids(rows: &[Row]) -> Result<Vec<String>, IntegrityError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.first()
                .and_then(Option::clone)
                .ok_or(IntegrityError::MalformedRow {
                    row: i,
                    reason: "missing device id",
                })
        })
        .collect()
}

/// `true` iff every id in `known_ids` has at least one record, and at least
/// one of its records is strictly above `threshold`.
///
/// Stops at the first id that fails.  No known ids means nothing can
/// object, so the result is `true`.
pub fn all_present_and_above_threshold(
    records: &[DeviceTemperatureRecord],
    known_ids: &[String],
    threshold: f64,
) -> bool {
    known_ids.iter().all(|id| {
        let mut present = false;
        let mut hot = false;
        for r in records.iter().filter(|r| &r.device_id == id) {
            present = true;
            if r.temperature > threshold {
                hot = true;
                break;
            }
        }
        present && hot
    })
}
