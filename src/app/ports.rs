//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (converters, relay, event sinks, config storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::config::SystemConfig;
use crate::error::{ActuatorError, AdcError, ConfigError};
use crate::fsm::PowerSource;
use crate::fsm::context::GenerationSnapshot;
use crate::sensors::BatteryReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain measurements.
///
/// Errors are returned, never papered over with a default value.  A
/// failed battery read must not look like 0 V.
pub trait SensorPort {
    /// Battery voltage, already calibrated.
    fn read_battery(&mut self) -> Result<BatteryReading, AdcError>;

    /// Wind turbine and solar panel V/I.
    fn read_generation(&mut self) -> Result<GenerationSnapshot, AdcError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to move the relay.
pub trait ActuatorPort {
    /// Route the 12V bus to `source`.
    fn select_source(&mut self, source: PowerSource) -> Result<(), ActuatorError>;

    /// Park the relay on `safe` and stop accepting commands.
    fn release(&mut self, safe: PowerSource) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values on both paths.  Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Load configuration.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}
