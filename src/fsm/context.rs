//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the latest sensor snapshot, the pending relay
//! command, timing information, the switching thresholds, and the read
//! fault mask.

use serde::Serialize;

use super::PowerSource;
use crate::config::SwitchThresholds;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Voltage and current of one generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GeneratorReading {
    pub volts: f32,
    pub amps: f32,
}

/// Wind turbine and solar panel output.  Telemetry only; never used for
/// switching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenerationSnapshot {
    pub wind: GeneratorReading,
    pub solar: GeneratorReading,
}

/// The most recent good measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Battery terminal voltage (V).
    pub battery_v: f32,
    /// Raw converter count behind `battery_v`.
    pub battery_raw: u32,
    pub generation: GenerationSnapshot,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Relay position requested by the last transition, until applied.
    pub relay: Option<PowerSource>,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in seconds.
    pub tick_period_secs: f32,

    // -- Sensor data --
    pub sensors: SensorSnapshot,

    // -- Actuator outputs --
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub thresholds: SwitchThresholds,

    // -- Faults --
    /// Read/actuation fault bitmask (see `ReadFault::mask()`).
    pub fault_flags: u8,
}

impl FsmContext {
    pub fn new(thresholds: SwitchThresholds, tick_period_secs: f32) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_secs,
            sensors: SensorSnapshot::default(),
            commands: ActuatorCommands::default(),
            thresholds,
            fault_flags: 0,
        }
    }

    /// Seconds elapsed since the current state was entered.
    pub fn secs_in_state(&self) -> f32 {
        self.ticks_in_state as f32 * self.tick_period_secs
    }
}
