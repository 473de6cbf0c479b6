//! Bridge loop against mock device and bus: startup, both outbound modes,
//! command rendering, reconnect, and shutdown.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use plantcare::adapters::time::FixedClock;
use plantcare::app::commands::DeviceCommand;
use plantcare::app::events::AppEvent;
use plantcare::app::ports::{BusError, DeviceError, Qos};
use plantcare::bridge::{Bridge, LinkState};
use plantcare::config::{OutboundMode, SystemConfig};
use plantcare::drivers::button::Button;
use plantcare::sensors::SensorChannel;

use super::mock_hw::{DeviceCall, MockBus, MockDevice, RecordingSink};

type TestBridge = Bridge<MockDevice, MockBus, RecordingSink, FixedClock>;

const NOW_UNIX: i64 = 1_720_000_000;

fn config(mode: OutboundMode) -> SystemConfig {
    SystemConfig {
        outbound_mode: mode,
        sample_collect_ms: 0,
        publish_interval_ms: 0,
        trigger_poll_ms: 0,
        reconnect_initial_ms: 1,
        reconnect_max_ms: 4,
        ..SystemConfig::default()
    }
}

fn bridge_with(mode: OutboundMode, device: MockDevice, bus: MockBus) -> TestBridge {
    let clock = FixedClock(Utc.timestamp_opt(NOW_UNIX, 0).unwrap());
    Bridge::new(&config(mode), device, bus, RecordingSink::new(), clock).unwrap()
}

fn started(mode: OutboundMode) -> TestBridge {
    let mut bridge = bridge_with(mode, MockDevice::new(), MockBus::new());
    bridge.start().unwrap();
    bridge
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_opens_device_subscribes_and_streams() {
    let bridge = started(OutboundMode::Button);
    assert_eq!(bridge.state(), LinkState::Streaming);
    assert_eq!(bridge.device().calls, vec![DeviceCall::Open]);
    assert_eq!(bridge.bus().connects, 1);
    assert_eq!(
        bridge.bus().subscriptions,
        vec![(
            vec!["iot/actor_data".to_string(), "iot/error".to_string()],
            Qos::AtLeastOnce
        )]
    );
    assert_eq!(
        bridge.sink().events,
        vec![
            AppEvent::LinkStateChanged {
                from: LinkState::Disconnected,
                to: LinkState::Connected
            },
            AppEvent::LinkStateChanged {
                from: LinkState::Connected,
                to: LinkState::Streaming
            },
        ]
    );
}

// ── Polled mode ───────────────────────────────────────────────

#[test]
fn polled_cycle_requests_stamps_and_publishes() {
    let device = MockDevice::answering(&[
        (SensorChannel::Temperature, 23.5),
        (SensorChannel::Humidity, 41.0),
        (SensorChannel::Light, 250.0),
        (SensorChannel::Proximity, 3.0),
    ]);
    let mut bridge = bridge_with(OutboundMode::Polled, device, MockBus::new());
    bridge.start().unwrap();
    bridge.cycle().unwrap();

    assert_eq!(
        bridge.device().calls[1..],
        [
            DeviceCall::Request(SensorChannel::Temperature),
            DeviceCall::Request(SensorChannel::Humidity),
            DeviceCall::Request(SensorChannel::Light),
            DeviceCall::Request(SensorChannel::Proximity),
        ]
    );

    let published = &bridge.bus().published;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "iot/sensor_data");
    assert_eq!(published[0].qos, Qos::AtLeastOnce);
    let json = published[0].json();
    assert_eq!(json["device_id"], "002");
    assert_eq!(json["timestamp"], NOW_UNIX);
    assert_eq!(json["inputName"], "sensorData");
    assert_eq!(json["temperature"], 23.5);
    assert_eq!(json["humidity"], 41.0);
    assert_eq!(json["light"], 250.0);
    assert_eq!(json["proximity"], 3.0);
    assert_eq!(json["pressure"], 0.0);
}

#[test]
fn polled_cycle_publishes_even_when_device_is_silent() {
    let mut bridge = started(OutboundMode::Polled);
    bridge.cycle().unwrap();
    bridge.cycle().unwrap();
    assert_eq!(bridge.bus().published.len(), 2);
}

// ── Button mode ───────────────────────────────────────────────

#[test]
fn button_mode_publishes_only_after_a_press() {
    let mut bridge = started(OutboundMode::Button);
    bridge.cycle().unwrap();
    assert!(bridge.bus().published.is_empty());

    bridge.device().sender().button(Button::A);
    bridge.cycle().unwrap();
    assert_eq!(bridge.bus().published.len(), 1);
    assert_eq!(bridge.bus().published[0].json()["temperature"], 30.0);
    assert!(!bridge.is_ready());

    bridge.cycle().unwrap();
    assert_eq!(bridge.bus().published.len(), 1);
}

#[test]
fn each_button_sets_its_preset() {
    let mut bridge = started(OutboundMode::Button);
    let tx = bridge.device().sender();
    tx.button(Button::B);
    tx.button(Button::X);
    bridge.cycle().unwrap();
    assert_eq!(bridge.snapshot().temperature, 20.0);
    assert_eq!(bridge.snapshot().humidity, 10.0);
    // Two presses drained in one cycle publish once.
    assert_eq!(bridge.bus().published.len(), 1);

    tx.button(Button::Y);
    bridge.cycle().unwrap();
    assert_eq!(bridge.bus().published[1].json()["humidity"], 30.0);
}

#[test]
fn polled_mode_button_press_does_not_raise_ready() {
    let mut bridge = started(OutboundMode::Polled);
    bridge.device().sender().button(Button::A);
    bridge.cycle().unwrap();
    assert_eq!(bridge.snapshot().temperature, 30.0);
    assert!(!bridge.is_ready());
    assert_eq!(bridge.bus().published.len(), 1);
}

#[test]
fn failed_publish_keeps_ready_until_reconnected() {
    let mut bus = MockBus::new();
    bus.publish_failures
        .push_back(BusError::Transport("eof".into()));
    let mut bridge = bridge_with(OutboundMode::Button, MockDevice::new(), bus);
    bridge.start().unwrap();

    bridge.device().sender().button(Button::A);
    let err = bridge.cycle().unwrap_err();
    assert!(err.is_transport());
    assert!(bridge.is_ready());

    bridge.recover();
    assert_eq!(bridge.state(), LinkState::Streaming);
    bridge.cycle().unwrap();
    assert_eq!(bridge.bus().published.len(), 1);
    assert!(!bridge.is_ready());
}

// ── Reconnect ─────────────────────────────────────────────────

#[test]
fn recover_retries_until_the_bus_is_back() {
    let mut bus = MockBus::new();
    bus.failing_reconnects = 2;
    let mut bridge = bridge_with(OutboundMode::Polled, MockDevice::new(), bus);
    bridge.start().unwrap();

    bridge.recover();

    assert_eq!(bridge.bus().reconnects, 3);
    assert_eq!(bridge.state(), LinkState::Streaming);
    assert!(
        bridge
            .sink()
            .events
            .contains(&AppEvent::Reconnected { attempts: 3 })
    );
    // Subscriptions are the bus's job to keep; the bridge does not resend.
    assert_eq!(bridge.bus().subscriptions.len(), 1);
}

#[test]
fn recover_passes_through_disconnected() {
    let mut bridge = started(OutboundMode::Polled);
    bridge.recover();
    let events = &bridge.sink().events;
    assert!(events.contains(&AppEvent::LinkStateChanged {
        from: LinkState::Streaming,
        to: LinkState::Disconnected
    }));
    assert_eq!(events.last(), Some(&AppEvent::Reconnected { attempts: 1 }));
}

#[test]
fn recover_gives_up_on_shutdown() {
    let mut bus = MockBus::new();
    bus.failing_reconnects = u32::MAX;
    let mut bridge = bridge_with(OutboundMode::Polled, MockDevice::new(), bus);
    bridge.start().unwrap();
    bridge.shutdown_handle().trigger();
    bridge.recover();
    assert_eq!(bridge.state(), LinkState::Disconnected);
    assert_eq!(bridge.bus().reconnects, 0);
}

// ── Inbound commands ──────────────────────────────────────────

#[test]
fn every_known_state_sets_led_and_display() {
    for command in DeviceCommand::ALL {
        let mut bridge = started(OutboundMode::Button);
        bridge.bus_mut().push_state("iot/actor_data", command.state());
        bridge.cycle().unwrap();

        assert_eq!(bridge.device().leds(), vec![command.rgb()]);
        assert_eq!(
            bridge.device().displays(),
            vec![format!("{}\n", command.text())]
        );
        assert_eq!(bridge.display().len(), 1);
    }
}

#[test]
fn commands_are_applied_while_idling_between_publishes() {
    let mut bridge = started(OutboundMode::Polled);
    bridge.bus_mut().push_state("iot/actor_data", "lights_on");
    assert!(bridge.idle(Duration::from_millis(20)));

    assert_eq!(bridge.device().leds(), vec![DeviceCommand::LightsOn.rgb()]);
    assert_eq!(bridge.display().len(), 1);
    // Nothing was requested or published while waiting.
    assert_eq!(bridge.device().calls.len(), 3);
    assert!(bridge.bus().published.is_empty());
}

#[test]
fn idle_stops_early_on_shutdown() {
    let mut bridge = started(OutboundMode::Polled);
    bridge.shutdown_handle().trigger();
    assert!(!bridge.idle(Duration::from_secs(10)));
}

#[test]
fn windows_open_renders_yellow() {
    let mut bridge = started(OutboundMode::Button);
    bridge.bus_mut().push_state("iot/actor_data", "windows_open");
    bridge.cycle().unwrap();
    assert_eq!(bridge.device().leds(), vec![(255, 255, 0)]);
    assert_eq!(bridge.device().displays(), vec!["Windows \nare open\n"]);
}

#[test]
fn history_keeps_three_newest_first() {
    let mut bridge = started(OutboundMode::Button);
    for state in ["lights_on", "windows_open", "sprinklers_on", "lights_off"] {
        bridge.bus_mut().push_state("iot/error", state);
    }
    bridge.cycle().unwrap();
    assert_eq!(
        bridge.device().displays().last().copied(),
        Some("Lights \nare off\nSprinklers \nare on\nWindows \nare open\n")
    );
    assert_eq!(bridge.display().len(), 3);
}

#[test]
fn unknown_state_changes_nothing() {
    let mut bridge = started(OutboundMode::Button);
    bridge.bus_mut().push_state("iot/actor_data", "doors_open");
    bridge.cycle().unwrap();
    assert_eq!(bridge.device().calls, vec![DeviceCall::Open]);
    assert!(bridge.display().is_empty());
    assert!(
        bridge
            .sink()
            .events
            .contains(&AppEvent::CommandIgnored("doors_open".into()))
    );
}

#[test]
fn undecodable_payload_is_dropped() {
    let mut bridge = started(OutboundMode::Button);
    bridge.bus_mut().push_raw("iot/actor_data", b"\xff not json");
    bridge.bus_mut().push_raw("iot/actor_data", br#"{"mode":"auto"}"#);
    bridge.bus_mut().push_state("iot/actor_data", "lights_on");
    bridge.cycle().unwrap();
    assert_eq!(bridge.device().leds(), vec![(0, 255, 255)]);
}

// ── Failures and shutdown ─────────────────────────────────────

struct BrokenDevice;

impl plantcare::app::ports::DevicePort for BrokenDevice {
    fn open(&mut self, _: plantcare::sensors::SampleSender) -> Result<(), DeviceError> {
        Ok(())
    }
    fn request(&mut self, _: SensorChannel) -> Result<(), DeviceError> {
        Err(DeviceError::Io("serial timeout".into()))
    }
    fn set_led(&mut self, _: plantcare::drivers::status_led::Rgb) -> Result<(), DeviceError> {
        Ok(())
    }
    fn set_display(&mut self, _: &str) -> Result<(), DeviceError> {
        Ok(())
    }
    fn stop(&mut self) {}
}

#[test]
fn device_fault_is_not_a_transport_fault() {
    let clock = FixedClock(Utc.timestamp_opt(NOW_UNIX, 0).unwrap());
    let mut bridge = Bridge::new(
        &config(OutboundMode::Polled),
        BrokenDevice,
        MockBus::new(),
        RecordingSink::new(),
        clock,
    )
    .unwrap();
    bridge.start().unwrap();
    let err = bridge.cycle().unwrap_err();
    assert!(!err.is_transport());
    assert!(bridge.bus().published.is_empty());
}

#[test]
fn run_stops_device_on_shutdown() {
    let mut bridge = bridge_with(OutboundMode::Polled, MockDevice::new(), MockBus::new());
    bridge.shutdown_handle().trigger();
    bridge.run().unwrap();
    assert_eq!(bridge.device().calls.first(), Some(&DeviceCall::Open));
    assert_eq!(bridge.device().calls.last(), Some(&DeviceCall::Stop));
    assert_eq!(bridge.state(), LinkState::Disconnected);
}

#[test]
fn run_stops_device_when_start_fails() {
    let mut bus = MockBus::new();
    bus.fail_connect = true;
    let mut bridge = bridge_with(OutboundMode::Polled, MockDevice::new(), bus);
    assert!(bridge.run().is_err());
    assert_eq!(bridge.device().calls.last(), Some(&DeviceCall::Stop));
}

#[test]
fn run_loops_until_signalled_from_another_thread() {
    let cfg = SystemConfig {
        publish_interval_ms: 5,
        ..config(OutboundMode::Polled)
    };
    let clock = FixedClock(Utc.timestamp_opt(NOW_UNIX, 0).unwrap());
    let mut bridge = Bridge::new(
        &cfg,
        MockDevice::new(),
        MockBus::new(),
        RecordingSink::new(),
        clock,
    )
    .unwrap();
    let shutdown = bridge.shutdown_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        shutdown.trigger();
    });
    bridge.run().unwrap();
    stopper.join().unwrap();
    assert!(!bridge.bus().published.is_empty());
    assert_eq!(bridge.device().calls.last(), Some(&DeviceCall::Stop));
}
