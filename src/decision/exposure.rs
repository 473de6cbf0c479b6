//! Daily sunlight exposure.
//!
//! The light query yields one row per reading above the light threshold,
//! paired with the time of the *next* light reading.  Each such pair is an
//! interval during which the plant is assumed to have been in sunlight:
//!
//! ```text
//!  reading:   ●────────●        ●────●────────●
//!  above?     yes      no       yes  yes      (last: no next yet)
//!  interval:  [start, end)      [s,e)[s,   e) [s, ?)
//! ```
//!
//! The trailing interval of the day has no `end` yet and contributes zero.

use chrono::{DateTime, Utc};

use crate::error::IntegrityError;
use crate::store::{Row, parse_timestamp};

const MICROS_PER_SEC: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureInterval {
    /// Light level of the reading that opened the interval.
    pub value: f64,
    pub start: DateTime<Utc>,
    /// Time of the next reading; `None` for the still-open trailing interval.
    pub end: Option<DateTime<Utc>>,
}

impl ExposureInterval {
    pub fn closed(value: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            value,
            start,
            end: Some(end),
        }
    }

    /// Duration in whole seconds.
    ///
    /// Both ends are truncated to microseconds first, then the difference
    /// is rounded to the nearest second with ties to even (2.5 s -> 2,
    /// 3.5 s -> 4).  `Ok(0)` for an open interval.
    pub fn rounded_secs(&self) -> Result<u64, IntegrityError> {
        let Some(end) = self.end else {
            return Ok(0);
        };
        if end < self.start {
            return Err(IntegrityError::NegativeInterval {
                start: self.start,
                end,
            });
        }
        let micros = end.timestamp_micros() - self.start.timestamp_micros();
        Ok(round_half_even(micros) as u64)
    }
}

/// Non-negative microseconds to whole seconds, ties to even.
fn round_half_even(micros: i64) -> i64 {
    let (secs, rem) = (micros / MICROS_PER_SEC, micros % MICROS_PER_SEC);
    let half = MICROS_PER_SEC / 2;
    if rem > half || (rem == half && secs % 2 == 1) {
        secs + 1
    } else {
        secs
    }
}

/// Decode `[value, time, next_time?]` rows into intervals.
pub fn decode_light_rows(rows: &[Row]) -> Result<Vec<ExposureInterval>, IntegrityError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let malformed = |reason| IntegrityError::MalformedRow { row: i, reason };

            let value = row
                .first()
                .and_then(Option::as_deref)
                .ok_or(malformed("missing light value"))?
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed("unparseable light value"))?;
            let start = row
                .get(1)
                .and_then(Option::as_deref)
                .ok_or(malformed("missing start time"))?;
            let start = parse_timestamp(start).ok_or(malformed("unparseable start time"))?;
            let end = match row.get(2).and_then(Option::as_deref) {
                Some(s) => Some(parse_timestamp(s).ok_or(malformed("unparseable end time"))?),
                None => None,
            };
            Ok(ExposureInterval { value, start, end })
        })
        .collect()
}

/// Total exposure in whole seconds: the sum of every closed interval's
/// rounded duration.  Intervals are taken in the order given.
pub fn compute_daily_exposure(intervals: &[ExposureInterval]) -> Result<u64, IntegrityError> {
    intervals
        .iter()
        .try_fold(0u64, |total, iv| Ok(total.saturating_add(iv.rounded_secs()?)))
}
