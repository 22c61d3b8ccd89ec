//! Source-select relay driver.
//!
//! One digital output switches the 12V bus between battery and mains.
//! Which line level means "battery" depends on how the relay is wired, so
//! the polarity is supplied at construction.
//!
//! ## Release contract
//!
//! [`RelayDriver::release`] drives the line to the safe source and then
//! refuses further commands.  The owner drops the pin afterwards.

use embedded_hal::digital::{Error as _, OutputPin, PinState};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ActuatorError;
use crate::fsm::PowerSource;

/// Line level, as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLevel {
    High,
    Low,
}

impl LineLevel {
    pub fn inverted(self) -> Self {
        match self {
            Self::High => Self::Low,
            Self::Low => Self::High,
        }
    }
}

impl From<LineLevel> for PinState {
    fn from(level: LineLevel) -> Self {
        match level {
            LineLevel::High => PinState::High,
            LineLevel::Low => PinState::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Never driven since construction.
    Undriven,
    Selected(PowerSource),
    /// Parked on the safe source; no longer accepts commands.
    Released(PowerSource),
}

pub struct RelayDriver<P> {
    pin: P,
    battery_level: LineLevel,
    state: RelayState,
}

impl<P: OutputPin> RelayDriver<P> {
    /// `battery_level` is the line level that routes the bus to the battery.
    pub fn new(pin: P, battery_level: LineLevel) -> Self {
        Self {
            pin,
            battery_level,
            state: RelayState::Undriven,
        }
    }

    /// Drive the line for `source`.
    pub fn select(&mut self, source: PowerSource) -> Result<(), ActuatorError> {
        if let RelayState::Released(_) = self.state {
            return Err(ActuatorError::Released);
        }
        self.drive(source)?;
        self.state = RelayState::Selected(source);
        Ok(())
    }

    /// Park the line on `safe` and stop accepting commands.
    pub fn release(&mut self, safe: PowerSource) -> Result<(), ActuatorError> {
        if let RelayState::Released(parked) = self.state {
            warn!("relay: already released on {:?}", parked);
            return Ok(());
        }
        self.drive(safe)?;
        self.state = RelayState::Released(safe);
        info!("relay: released on {:?}", safe);
        Ok(())
    }

    /// Line level that corresponds to `source`.
    pub fn level_for(&self, source: PowerSource) -> LineLevel {
        match source {
            PowerSource::Battery => self.battery_level,
            PowerSource::Mains => self.battery_level.inverted(),
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Give the pin back (e.g. to hand it to a different owner in tests).
    pub fn into_inner(self) -> P {
        self.pin
    }

    fn drive(&mut self, source: PowerSource) -> Result<(), ActuatorError> {
        let level = self.level_for(source);
        self.pin
            .set_state(level.into())
            .map_err(|e| ActuatorError::LineWriteFailed(e.kind()))
    }
}
