//! Device-side building blocks: buttons, LED colours, display history.

pub mod button;
pub mod display;
pub mod status_led;
