//! Evaluation scheduler.
//!
//! Drives the light and windows evaluations on their own cadences.  The
//! scheduler only keeps time; when an entry falls due it notifies a
//! [`SchedulerDelegate`], which runs the matching evaluation.
//!
//! ```text
//!  ┌──────────────┐  tick(elapsed)  ┌──────────────┐  on_schedule_fired  ┌──────────────┐
//!  │ worker loop  │────────────────▶│  Scheduler   │────────────────────▶│  delegate    │
//!  └──────────────┘                 └──────────────┘                     │ (evaluations)│
//!                                                                        └──────────────┘
//! ```

use core::time::Duration;

use heapless::Vec;
use log::{debug, info};

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};

/// Maximum number of concurrent schedules.
const MAX_SCHEDULES: usize = 4;

#[derive(Debug, Clone)]
pub struct Schedule {
    /// Label handed to the delegate (e.g. `"light"`).
    pub label: &'static str,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval`.
    Periodic { interval: Duration },
    /// Fire once after `delay`, then auto-disable.
    OneShot { delay: Duration },
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    elapsed: Duration,
}

pub struct Scheduler {
    entries: Vec<ScheduleEntry, MAX_SCHEDULES>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a schedule.  Returns its slot, or `None` if all slots are taken.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        let label = schedule.label;
        self.entries
            .push(ScheduleEntry {
                schedule,
                elapsed: Duration::ZERO,
            })
            .ok()?;
        let slot = self.entries.len() - 1;
        info!("Scheduler: added '{}' at slot {}", label, slot);
        Some(slot)
    }

    /// Advance every enabled schedule by `elapsed` and notify `delegate`
    /// for each one that falls due.
    ///
    /// A periodic entry fires at most once per tick even if `elapsed`
    /// spans several intervals; missed fires are not replayed.
    pub fn tick(&mut self, elapsed: Duration, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.entries.iter_mut().filter(|e| e.schedule.enabled) {
            entry.elapsed = entry.elapsed.saturating_add(elapsed);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval } => {
                    if entry.elapsed >= interval {
                        debug!(
                            "Scheduler: '{}' periodic fire (every {:?})",
                            entry.schedule.label, interval
                        );
                        entry.elapsed = Duration::ZERO;
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Periodic);
                    }
                }
                ScheduleKind::OneShot { delay } => {
                    if entry.elapsed >= delay {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {:?})",
                            entry.schedule.label, delay
                        );
                        entry.schedule.enabled = false;
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::OneShot);
                    }
                }
            }
        }
    }

    /// Number of enabled schedules.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.schedule.enabled).count()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
