//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                 |
//! |---------------|--------------------|-----------------------------|
//! | `hardware`    | SensorPort         | MCP3424 pair over SMBus     |
//! |               | ActuatorPort       | Relay GPIO                  |
//! | `log_sink`    | EventSink          | `log` facade                |
//! | `config_file` | ConfigPort         | JSON file                   |
//! | `rpi`         | SmbusTransport     | `/dev/i2c-N`, BCM GPIO      |

pub mod config_file;
pub mod hardware;
pub mod log_sink;
#[cfg(feature = "rpi")]
pub mod rpi;
