//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements    | Connects to                     |
//! |----------------|---------------|---------------------------------|
//! | `config_file`  | ConfigPort    | JSON file on disk               |
//! | `log_sink`     | EventSink     | `log` facade                    |
//! | `memory_store` | SensorStore   | In-process reading table        |
//! |                | EventSink     | Snapshot ingestion              |
//! | `mqtt`         | BusPort       | MQTT broker (`rumqttc`, TLS)    |
//! | `sim_device`   | DevicePort    | Simulated sensor/display device |
//! | `time`         | TimePort      | System clock                    |

pub mod config_file;
pub mod log_sink;
pub mod memory_store;
pub mod mqtt;
pub mod sim_device;
pub mod time;
