//! Control decisions derived from stored sensor history.
//!
//! ```text
//! SensorStore rows ──▶ exposure  ──▶ NeedsLight(bool)  ─┐
//!                  └─▶ consensus ──▶ OpenWindows(bool) ─┴─▶ decision topic
//! ```
//!
//! Both evaluators are pure: they decode rows, compute, and return.  Any
//! I/O happens in [`DecisionService`](crate::app::service::DecisionService).

pub mod consensus;
pub mod exposure;

use serde::{Deserialize, Serialize};

/// A binary control decision, serialized as a single-key JSON object
/// (`{"need_light": true}`, `{"open_windows": false}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[serde(rename = "need_light")]
    NeedsLight(bool),
    OpenWindows(bool),
}

impl Decision {
    /// Human-readable outcome reported back to the caller.
    pub fn status(self) -> &'static str {
        match self {
            Self::NeedsLight(true) => "needs light",
            Self::NeedsLight(false) => "doesn't need light",
            Self::OpenWindows(true) => "opening windows",
            Self::OpenWindows(false) => "not opening windows",
        }
    }

    pub fn to_json(self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self)
    }
}

/// Map a daily exposure total onto the light decision.  Light is needed
/// unless the target was strictly exceeded.
pub fn light_decision(total_secs: u64, target_secs: u64) -> Decision {
    Decision::NeedsLight(total_secs <= target_secs)
}
