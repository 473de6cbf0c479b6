//! Application core: domain orchestration, no direct I/O.
//!
//! This module holds the decision service and the vocabulary the bridge
//! and adapters share: inbound commands, outbound events, and the
//! **port traits** in [`ports`] every adapter implements.  Everything here
//! is testable without a broker, a store, or a device.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
