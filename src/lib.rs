//! Plant-care sensor decision engine and device actuation bridge.
//!
//! Exposes the domain modules for the binary and for integration testing.
//! Everything that touches the network, the disk or a device lives in
//! [`adapters`]; the rest only speaks through the port traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bridge;
pub mod config;
pub mod decision;
pub mod drivers;
pub mod error;
pub mod scheduler;
pub mod sensors;
pub mod store;
