//! Sensor subsystem: calibration and the aggregating [`SensorHub`].
//!
//! The hub owns the bus and both converters.  The voltage converter sees
//! the battery and generator dividers, the current converter sees the
//! generator shunts.  Both share one bus handle and are read one after the
//! other, never concurrently.

pub mod calibration;

use log::debug;

use crate::config::SystemConfig;
use crate::drivers::bus::SmbusTransport;
use crate::drivers::mcp3424::{Channel, Mcp3424, Resolution};
use crate::error::AdcError;
use crate::fsm::context::{GenerationSnapshot, GeneratorReading};
use calibration::CalibrationCurve;

/// One battery measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub raw: u32,
    pub volts: f32,
}

/// Converts raw samples from both converters into physical units.
pub struct SensorHub<B> {
    bus: B,
    voltage_adc: Mcp3424,
    current_adc: Mcp3424,
    battery_channel: Channel,
    wind_channel: Channel,
    solar_channel: Channel,
    battery_curve: CalibrationCurve,
    voltage_curve: CalibrationCurve,
    current_curve: CalibrationCurve,
}

impl<B: SmbusTransport> SensorHub<B> {
    /// Build the hub and apply the converter settings from `cfg`.
    ///
    /// No bus traffic happens here; the first transfer is the first read.
    pub fn new(bus: B, cfg: &SystemConfig) -> Result<Self, AdcError> {
        let make = |address| -> Result<Mcp3424, AdcError> {
            let mut adc = Mcp3424::new(address, Resolution::Bits14)
                .with_max_read_attempts(cfg.max_read_attempts);
            adc.configure(&cfg.adc)?;
            Ok(adc)
        };

        Ok(Self {
            bus,
            voltage_adc: make(cfg.voltage_adc_address)?,
            current_adc: make(cfg.current_adc_address)?,
            battery_channel: cfg.battery_channel,
            wind_channel: cfg.wind_channel,
            solar_channel: cfg.solar_channel,
            battery_curve: cfg.battery_curve,
            voltage_curve: cfg.generation_voltage_curve,
            current_curve: cfg.generation_current_curve,
        })
    }

    /// Read and convert the battery voltage.
    pub fn read_battery(&mut self) -> Result<BatteryReading, AdcError> {
        let sample = self.voltage_adc.read_raw(&mut self.bus, self.battery_channel)?;
        let volts = self.battery_curve.map(sample.raw);
        debug!("battery: raw={} → {:.3} V", sample.raw, volts);
        Ok(BatteryReading {
            raw: sample.raw,
            volts,
        })
    }

    /// Read wind turbine and solar panel V/I.  Any failed read fails the
    /// whole snapshot.
    pub fn read_generation(&mut self) -> Result<GenerationSnapshot, AdcError> {
        let wind = self.read_generator(self.wind_channel)?;
        let solar = self.read_generator(self.solar_channel)?;
        Ok(GenerationSnapshot { wind, solar })
    }

    pub fn voltage_adc(&self) -> &Mcp3424 {
        &self.voltage_adc
    }

    pub fn current_adc(&self) -> &Mcp3424 {
        &self.current_adc
    }

    /// Give the bus back to the caller.
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn read_generator(&mut self, channel: Channel) -> Result<GeneratorReading, AdcError> {
        let v = self.voltage_adc.read_raw(&mut self.bus, channel)?;
        let i = self.current_adc.read_raw(&mut self.bus, channel)?;
        Ok(GeneratorReading {
            volts: self.voltage_curve.map(v.raw),
            amps: self.current_curve.map(i.raw),
        })
    }
}
