//! Fuzz target: store row decoding.
//!
//! Splits the input into rows of nullable cells and feeds them to every
//! row decoder.  Decoders must return a typed error on bad input, never
//! panic, and a decoded light table must aggregate without overflow.
//!
//! cargo fuzz run fuzz_store_rows

#![no_main]

use libfuzzer_sys::fuzz_target;
use plantcare::decision::consensus::{decode_device_ids, decode_temperature_rows};
use plantcare::decision::exposure::{compute_daily_exposure, decode_light_rows};
use plantcare::store::Row;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // One row per line, cells separated by '|', "~" is a null cell.
    let rows: Vec<Row> = text
        .lines()
        .map(|line| {
            line.split('|')
                .map(|cell| (cell != "~").then(|| cell.to_owned()))
                .collect()
        })
        .collect();

    if let Ok(intervals) = decode_light_rows(&rows) {
        let _ = compute_daily_exposure(&intervals);
    }
    let _ = decode_temperature_rows(&rows);
    let _ = decode_device_ids(&rows);
});
