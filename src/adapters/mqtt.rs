//! MQTT bus adapter (`rumqttc`).
//!
//! Implements [`BusPort`] over a synchronous `rumqttc` client.  The
//! connection event loop runs on its own thread:
//!
//! ```text
//!  ┌──────────────────────┐  InboundMessage (bounded)  ┌─────────────┐
//!  │ MQTT connection      │───────────────────────────▶│ try_recv()  │
//!  │ thread               │                            │ (bridge)    │
//!  │  · ConnAck → resub   │  connected: AtomicBool     │ publish()   │
//!  │  · error  → backoff  │───────────────────────────▶│ reconnect() │
//!  └──────────────────────┘                            └─────────────┘
//! ```
//!
//! `rumqttc` reconnects on its own whenever the event loop is polled after
//! an error; the thread only paces those retries and re-sends every
//! subscription after each ConnAck.  `publish` refuses with
//! [`BusError::Transport`] while the link is down so the caller can run
//! its reconnect path instead of silently queueing.

use core::time::Duration;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, error, info, warn};
use rumqttc::{
    Client, Connection, ConnectionError, Event, Incoming, MqttOptions, QoS, SubscribeFilter,
    TlsConfiguration, Transport,
};

use crate::app::ports::{BusError, BusPort, InboundMessage, Qos};
use crate::bridge::Backoff;
use crate::config::SystemConfig;

/// Undelivered inbound messages held before new ones are dropped.
const INBOUND_QUEUE_DEPTH: usize = 16;
/// Outstanding requests between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 16;
/// How long [`BusPort::reconnect`] waits for the event loop to report a
/// fresh ConnAck.
const RECONNECT_WAIT: Duration = Duration::from_secs(5);

type InboundChannel = Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_QUEUE_DEPTH>;

/// Cloneable bus handle; clones share one connection.
#[derive(Clone)]
pub struct MqttBus {
    client: Client,
    connection: Arc<Mutex<Option<Connection>>>,
    connected: Arc<AtomicBool>,
    subscriptions: Arc<Mutex<Vec<SubscribeFilter>>>,
    inbound: Arc<InboundChannel>,
    retry_initial: Duration,
    retry_max: Duration,
}

fn to_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

impl MqttBus {
    /// Build the client from configuration.  Reads the TLS files, if any;
    /// no network traffic happens until [`connect`](BusPort::connect).
    pub fn new(config: &SystemConfig) -> anyhow::Result<Self> {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        if let Some(tls) = &config.tls {
            let ca = fs::read(&tls.ca_path)
                .with_context(|| format!("reading CA {}", tls.ca_path.display()))?;
            let cert = fs::read(&tls.cert_path)
                .with_context(|| format!("reading client cert {}", tls.cert_path.display()))?;
            let key = fs::read(&tls.key_path)
                .with_context(|| format!("reading client key {}", tls.key_path.display()))?;
            options.set_transport(Transport::Tls(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: Some((cert, key)),
            }));
            info!("MQTT: mutual TLS enabled");
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(Some(connection))),
            connected: Arc::new(AtomicBool::new(false)),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            inbound: Arc::new(InboundChannel::new()),
            retry_initial: Duration::from_millis(u64::from(config.reconnect_initial_ms)),
            retry_max: Duration::from_millis(u64::from(config.reconnect_max_ms)),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Ask the broker for a clean disconnect; the event loop thread ends.
    pub fn disconnect(&self) {
        if let Err(e) = self.client.disconnect() {
            debug!("MQTT: disconnect request failed: {}", e);
        }
    }

    fn spawn_event_loop(&self, mut connection: Connection) -> Result<(), BusError> {
        let client = self.client.clone();
        let connected = self.connected.clone();
        let subscriptions = self.subscriptions.clone();
        let inbound = self.inbound.clone();
        let mut backoff = Backoff::new(self.retry_initial, self.retry_max);

        std::thread::Builder::new()
            .name("mqtt-eventloop".into())
            .spawn(move || {
                for notification in connection.iter() {
                    match notification {
                        Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                            info!("MQTT: connected ({:?})", ack.code);
                            connected.store(true, Ordering::SeqCst);
                            backoff.reset();
                            resubscribe(&client, &subscriptions);
                        }
                        Ok(Event::Incoming(Incoming::Publish(p))) => {
                            let message = InboundMessage {
                                topic: p.topic.clone(),
                                payload: p.payload.to_vec(),
                            };
                            if inbound.try_send(message).is_err() {
                                warn!("MQTT: inbound queue full, dropping message on {}", p.topic);
                            }
                        }
                        Ok(Event::Incoming(Incoming::Disconnect)) => {
                            connected.store(false, Ordering::SeqCst);
                            warn!("MQTT: broker sent disconnect");
                        }
                        Ok(_) => {}
                        Err(ConnectionError::RequestsDone) => {
                            info!("MQTT: client closed, event loop exiting");
                            break;
                        }
                        Err(e) => {
                            connected.store(false, Ordering::SeqCst);
                            let delay = backoff.next_delay();
                            error!("MQTT: connection error: {} (retry in {:?})", e, delay);
                            std::thread::sleep(delay);
                        }
                    }
                }
                connected.store(false, Ordering::SeqCst);
            })
            .map_err(|e| BusError::Transport(format!("spawning event loop: {e}")))?;
        Ok(())
    }
}

fn resubscribe(client: &Client, subscriptions: &Mutex<Vec<SubscribeFilter>>) {
    let filters = match subscriptions.lock() {
        Ok(filters) => filters.clone(),
        Err(_) => {
            error!("MQTT: subscription list poisoned");
            return;
        }
    };
    if filters.is_empty() {
        return;
    }
    match client.try_subscribe_many(filters) {
        Ok(()) => debug!("MQTT: subscriptions restored"),
        Err(e) => warn!("MQTT: resubscribe failed: {}", e),
    }
}

impl BusPort for MqttBus {
    fn connect(&mut self) -> Result<(), BusError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| BusError::Transport("connection slot poisoned".into()))?
            .take();
        match connection {
            Some(connection) => {
                info!("MQTT: starting event loop");
                self.spawn_event_loop(connection)
            }
            // Another clone already started the shared event loop.
            None => Ok(()),
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), BusError> {
        if !self.is_connected() {
            return Err(BusError::Transport("not connected".into()));
        }
        self.client
            .try_publish(topic, to_qos(qos), false, payload.to_vec())
            .map_err(|e| BusError::Transport(e.to_string()))
    }

    fn subscribe(&mut self, topics: &[String], qos: Qos) -> Result<(), BusError> {
        let filters: Vec<SubscribeFilter> = topics
            .iter()
            .map(|t| SubscribeFilter::new(t.clone(), to_qos(qos)))
            .collect();
        self.subscriptions
            .lock()
            .map_err(|_| BusError::Rejected("subscription list poisoned".into()))?
            .extend(filters.iter().cloned());
        // Sent now if connected, otherwise on the next ConnAck.
        if self.is_connected() {
            self.client
                .try_subscribe_many(filters)
                .map_err(|e| BusError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), BusError> {
        let deadline = Instant::now() + RECONNECT_WAIT;
        while Instant::now() < deadline {
            if self.is_connected() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        Err(BusError::Transport("broker still unreachable".into()))
    }

    fn try_recv(&mut self) -> Option<InboundMessage> {
        self.inbound.try_receive().ok()
    }
}
