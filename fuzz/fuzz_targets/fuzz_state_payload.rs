//! Fuzz target: inbound command payloads.
//!
//! Arbitrary bytes from the broker must never panic the decoder, and a
//! decoded state either maps to exactly one table entry or to none.
//!
//! cargo fuzz run fuzz_state_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use plantcare::app::commands::{DeviceCommand, parse_state};
use plantcare::drivers::display::DisplayHistory;

fuzz_target!(|data: &[u8]| {
    let Ok(state) = parse_state(data) else {
        return;
    };
    if let Some(command) = DeviceCommand::from_state(&state) {
        assert_eq!(command.state(), state);
        let mut history: DisplayHistory = DisplayHistory::new();
        let rendered = history.append(command.text());
        assert!(rendered.ends_with('\n'));
    }
});
