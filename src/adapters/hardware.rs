//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the relay driver, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  Both are generic over their
//! transport, so the same adapter runs on the Pi (rppal) and against mock
//! buses and pins in tests.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::bus::SmbusTransport;
use crate::drivers::relay::{RelayDriver, RelayState};
use crate::error::{ActuatorError, AdcError};
use crate::fsm::PowerSource;
use crate::fsm::context::GenerationSnapshot;
use crate::sensors::{BatteryReading, SensorHub};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<B, P> {
    sensor_hub: SensorHub<B>,
    relay: RelayDriver<P>,
}

impl<B: SmbusTransport, P: OutputPin> HardwareAdapter<B, P> {
    pub fn new(sensor_hub: SensorHub<B>, relay: RelayDriver<P>) -> Self {
        Self { sensor_hub, relay }
    }

    pub fn sensor_hub(&self) -> &SensorHub<B> {
        &self.sensor_hub
    }

    pub fn relay_state(&self) -> RelayState {
        self.relay.state()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<B: SmbusTransport, P: OutputPin> SensorPort for HardwareAdapter<B, P> {
    fn read_battery(&mut self) -> Result<BatteryReading, AdcError> {
        self.sensor_hub.read_battery()
    }

    fn read_generation(&mut self) -> Result<GenerationSnapshot, AdcError> {
        self.sensor_hub.read_generation()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<B: SmbusTransport, P: OutputPin> ActuatorPort for HardwareAdapter<B, P> {
    fn select_source(&mut self, source: PowerSource) -> Result<(), ActuatorError> {
        self.relay.select(source)
    }

    fn release(&mut self, safe: PowerSource) -> Result<(), ActuatorError> {
        self.relay.release(safe)
    }
}
