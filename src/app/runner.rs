//! Scheduler delegate that runs the evaluations.
//!
//! Owns one set of adapters and a [`DecisionService`]; every schedule fire
//! becomes one synchronous evaluation.  Failures are logged and the next
//! fire tries again.

use log::{debug, error, info, warn};

use super::ports::{
    BusPort, EventSink, ScheduleFiredKind, SchedulerDelegate, SensorStore, TimePort,
};
use super::service::DecisionService;

pub const LIGHT_SCHEDULE: &str = "light";
pub const WINDOWS_SCHEDULE: &str = "windows";
/// One-shot that runs both evaluations right after startup.
pub const STARTUP_SCHEDULE: &str = "startup";

pub struct EvaluationRunner<St, B, S, C> {
    service: DecisionService,
    store: St,
    bus: B,
    sink: S,
    clock: C,
}

impl<St, B, S, C> EvaluationRunner<St, B, S, C>
where
    St: SensorStore,
    B: BusPort,
    S: EventSink,
    C: TimePort,
{
    pub fn new(service: DecisionService, store: St, bus: B, sink: S, clock: C) -> Self {
        Self {
            service,
            store,
            bus,
            sink,
            clock,
        }
    }

    /// Light evaluation, skipped while it is still bright outside.
    pub fn run_light(&mut self) {
        match self.service.light_is_low(&mut self.store) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Runner: light above threshold, skipping light evaluation");
                return;
            }
            Err(e) => {
                error!("Runner: current light unavailable: {}", e);
                return;
            }
        }
        let now = self.clock.now();
        match self
            .service
            .evaluate_light(now, &mut self.store, &mut self.bus, &mut self.sink)
        {
            Ok(gate) => info!("Runner: light evaluation {}", gate.as_str()),
            Err(e) => error!("Runner: light evaluation failed: {}", e),
        }
    }

    pub fn run_windows(&mut self) {
        match self
            .service
            .evaluate_windows(&mut self.store, &mut self.bus, &mut self.sink)
        {
            Ok(outcome) => info!("Runner: {}", outcome.status()),
            Err(e) => error!("Runner: windows evaluation failed: {}", e),
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<St, B, S, C> SchedulerDelegate for EvaluationRunner<St, B, S, C>
where
    St: SensorStore,
    B: BusPort,
    S: EventSink,
    C: TimePort,
{
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        debug!("Runner: '{}' fired ({:?})", label, kind);
        match label {
            LIGHT_SCHEDULE => self.run_light(),
            WINDOWS_SCHEDULE => self.run_windows(),
            STARTUP_SCHEDULE => {
                self.run_light();
                self.run_windows();
            }
            other => warn!("Runner: no evaluation for schedule '{}'", other),
        }
    }
}
