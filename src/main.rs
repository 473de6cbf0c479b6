//! PlantCare: main entry point.
//!
//! Wires the adapters to the bridge and the evaluation scheduler.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                      │
//! │                                                               │
//! │  SimDevice      MqttBus       SharedStore     SystemClock     │
//! │  (DevicePort)   (BusPort)     (SensorStore)   (TimePort)      │
//! │  LogEventSink   StoreIngestSink   FileConfigAdapter           │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  main thread:      Bridge (samples ▸ snapshot ▸ bus,          │
//! │                            commands ▸ LED + display)          │
//! │  evaluation thread: Scheduler ▸ EvaluationRunner              │
//! │                            ▸ DecisionService                  │
//! │  stdin thread:      A/B/X/Y lines ▸ ButtonPanel               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::time::Duration;
use std::io::BufRead;

use anyhow::{Context, Result};
use log::{info, warn};

use plantcare::adapters::config_file::FileConfigAdapter;
use plantcare::adapters::log_sink::LogEventSink;
use plantcare::adapters::memory_store::{MemoryStore, SharedStore, StoreIngestSink};
use plantcare::adapters::mqtt::MqttBus;
use plantcare::adapters::sim_device::{ButtonPanel, SimDevice};
use plantcare::adapters::time::SystemClock;
use plantcare::app::ports::ConfigPort;
use plantcare::app::runner::{
    EvaluationRunner, LIGHT_SCHEDULE, STARTUP_SCHEDULE, WINDOWS_SCHEDULE,
};
use plantcare::app::service::DecisionService;
use plantcare::bridge::{Bridge, ShutdownHandle};
use plantcare::config::SystemConfig;
use plantcare::drivers::button::Button;
use plantcare::scheduler::{Schedule, ScheduleKind, Scheduler};

/// Environment variable naming the JSON config file.
const CONFIG_ENV: &str = "PLANTCARE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "plantcare.json";
/// Evaluation scheduler resolution.
const SCHEDULER_TICK: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  PlantCare v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = match FileConfigAdapter::new(&config_path).load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load from {} failed ({}), using defaults", config_path, e);
            SystemConfig::default()
        }
    };
    info!(
        "Device {} → {}:{} ({:?} mode)",
        config.device_id, config.broker_host, config.broker_port, config.outbound_mode
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let store = SharedStore::new(MemoryStore::with_retention(config.store_retention()));
    let bus = MqttBus::new(&config).context("building MQTT client")?;
    let device = SimDevice::new();
    let buttons = device.buttons();

    // ── 4. Bridge ─────────────────────────────────────────────
    let sink = (
        LogEventSink::new(),
        StoreIngestSink::new(store.clone(), SystemClock),
    );
    let mut bridge = Bridge::new(&config, device, bus.clone(), sink, SystemClock)
        .context("bridge configuration")?;
    let shutdown = bridge.shutdown_handle();

    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Signal received, shutting down");
            shutdown.trigger();
        })
        .context("installing signal handler")?;
    }

    // ── 5. Evaluation thread ──────────────────────────────────
    let service = DecisionService::new(&config).context("decision configuration")?;
    let runner = EvaluationRunner::new(service, store, bus.clone(), LogEventSink::new(), SystemClock);
    let evaluations = spawn_evaluations(&config, runner, shutdown.clone())?;

    // ── 6. Button input ───────────────────────────────────────
    spawn_button_reader(buttons)?;

    // ── 7. Bridge loop (until signal) ─────────────────────────
    info!("System ready. Type A, B, X or Y + Enter to press a button.");
    let result = bridge.run();

    shutdown.trigger();
    bus.disconnect();
    if evaluations.join().is_err() {
        warn!("Evaluation thread panicked");
    }
    result.context("bridge loop")?;
    info!("Shutdown complete");
    Ok(())
}

fn spawn_evaluations(
    config: &SystemConfig,
    mut runner: EvaluationRunner<SharedStore, MqttBus, LogEventSink, SystemClock>,
    shutdown: ShutdownHandle,
) -> Result<std::thread::JoinHandle<()>> {
    let mut scheduler = Scheduler::new();
    let entries = [
        (
            STARTUP_SCHEDULE,
            ScheduleKind::OneShot {
                delay: Duration::from_secs(5),
            },
        ),
        (
            LIGHT_SCHEDULE,
            ScheduleKind::Periodic {
                interval: Duration::from_secs(u64::from(config.light_eval_interval_secs)),
            },
        ),
        (
            WINDOWS_SCHEDULE,
            ScheduleKind::Periodic {
                interval: Duration::from_secs(u64::from(config.windows_eval_interval_secs)),
            },
        ),
    ];
    for (label, kind) in entries {
        scheduler.add(Schedule {
            label,
            kind,
            enabled: true,
        });
    }

    std::thread::Builder::new()
        .name("evaluations".into())
        .spawn(move || {
            while shutdown.sleep(SCHEDULER_TICK) {
                scheduler.tick(SCHEDULER_TICK, &mut runner);
            }
            info!("Evaluations: stopped");
        })
        .context("spawning evaluation thread")
}

/// Read button labels from stdin until EOF.  The thread is left detached:
/// a blocking read cannot be interrupted and dies with the process.
fn spawn_button_reader(buttons: ButtonPanel) -> Result<()> {
    std::thread::Builder::new()
        .name("buttons".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Button::from_label(&line) {
                    Some(button) => {
                        buttons.press(button);
                    }
                    None => warn!("Unknown button '{}', expected A, B, X or Y", line.trim()),
                }
            }
        })
        .context("spawning button reader")?;
    Ok(())
}
