//! Scheduler → EvaluationRunner → DecisionService wiring.

use chrono::{TimeZone, Utc};
use std::time::Duration;

use plantcare::adapters::time::FixedClock;
use plantcare::app::ports::{ScheduleFiredKind, SchedulerDelegate};
use plantcare::app::runner::{
    EvaluationRunner, LIGHT_SCHEDULE, STARTUP_SCHEDULE, WINDOWS_SCHEDULE,
};
use plantcare::app::service::DecisionService;
use plantcare::config::SystemConfig;
use plantcare::scheduler::{Schedule, ScheduleKind, Scheduler};

use super::mock_hw::{MockBus, MockStore, RecordingSink};

type TestRunner = EvaluationRunner<MockStore, MockBus, RecordingSink, FixedClock>;

/// 18:30 in Berlin on a summer evening.
fn evening() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 7, 10, 16, 30, 0).unwrap())
}

fn runner(store: MockStore, clock: FixedClock) -> TestRunner {
    let service = DecisionService::new(&SystemConfig::default()).unwrap();
    EvaluationRunner::new(service, store, MockBus::new(), RecordingSink::new(), clock)
}

#[test]
fn light_fire_evaluates_when_dark() {
    let mut r = runner(MockStore::new().current_light(5.0), evening());
    r.on_schedule_fired(LIGHT_SCHEDULE, ScheduleFiredKind::Periodic);
    assert_eq!(r.bus().published.len(), 1);
    assert_eq!(r.bus().published[0].json()["need_light"], true);
}

#[test]
fn light_fire_skips_while_bright() {
    let mut r = runner(MockStore::new().current_light(400.0), evening());
    r.on_schedule_fired(LIGHT_SCHEDULE, ScheduleFiredKind::Periodic);
    assert!(r.bus().published.is_empty());
    // Only the current-light probe ran.
    assert_eq!(r.store().queries.len(), 1);
}

#[test]
fn light_fire_before_cutoff_publishes_nothing() {
    let noon = FixedClock(Utc.with_ymd_and_hms(2024, 7, 10, 10, 0, 0).unwrap());
    let mut r = runner(MockStore::new(), noon);
    r.on_schedule_fired(LIGHT_SCHEDULE, ScheduleFiredKind::Periodic);
    assert!(r.bus().published.is_empty());
}

#[test]
fn windows_fire_ignores_time_of_day() {
    let noon = FixedClock(Utc.with_ymd_and_hms(2024, 7, 10, 10, 0, 0).unwrap());
    let store = MockStore::new()
        .device("002")
        .temperature("002", 29.0, "2024-07-10 09:59:00.000000000");
    let mut r = runner(store, noon);
    r.on_schedule_fired(WINDOWS_SCHEDULE, ScheduleFiredKind::Periodic);
    assert_eq!(r.bus().published[0].payload, br#"{"open_windows":true}"#);
}

#[test]
fn startup_runs_both_and_unknown_labels_nothing() {
    let mut r = runner(MockStore::new(), evening());
    r.on_schedule_fired("compost", ScheduleFiredKind::OneShot);
    assert!(r.bus().published.is_empty());

    r.on_schedule_fired(STARTUP_SCHEDULE, ScheduleFiredKind::OneShot);
    let payloads: Vec<_> = r.bus().published.iter().map(|p| p.json()).collect();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0]["need_light"], true);
    assert_eq!(payloads[1]["open_windows"], true);
}

#[test]
fn scheduler_drives_runner_on_cadence() {
    let mut r = runner(MockStore::new(), evening());
    let mut sched = Scheduler::new();
    sched.add(Schedule {
        label: WINDOWS_SCHEDULE,
        kind: ScheduleKind::Periodic {
            interval: Duration::from_secs(300),
        },
        enabled: true,
    });
    for _ in 0..10 {
        sched.tick(Duration::from_secs(60), &mut r);
    }
    assert_eq!(r.bus().published.len(), 2);
}
