//! System configuration parameters
//!
//! All tunable parameters for the off-grid controller.  Defaults match the
//! bench prototype; a JSON file (see `adapters::config_file`) overrides any
//! subset of fields.

use serde::{Deserialize, Serialize};

use crate::drivers::mcp3424::{ADDRESS_RANGE, AdcSettings, Channel};
use crate::drivers::relay::LineLevel;
use crate::error::ConfigError;
use crate::fsm::PowerSource;
use crate::pins;
use crate::sensors::calibration::CalibrationCurve;

/// The two voltages that define the battery/mains hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchThresholds {
    /// At or below this battery voltage the bus moves to mains.
    pub low_v: f32,
    /// Extra voltage the battery must regain before moving back.
    pub hysteresis_v: f32,
}

impl SwitchThresholds {
    /// Voltage at or above which the bus returns to battery.
    pub fn recover_v(&self) -> f32 {
        self.low_v + self.hysteresis_v
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Bus ---
    /// `/dev/i2c-N` bus number.
    pub i2c_bus: u8,
    /// Converter wired to the voltage dividers.
    pub voltage_adc_address: u8,
    /// Converter wired to the current shunts.
    pub current_adc_address: u8,
    /// Resolution, conversion mode and gain applied to both converters.
    pub adc: AdcSettings,
    /// Block reads attempted per sample before giving up.
    pub max_read_attempts: u8,

    // --- Channels ---
    pub battery_channel: Channel,
    pub wind_channel: Channel,
    pub solar_channel: Channel,
    /// Read wind and solar V/I each cycle.
    pub generation_enabled: bool,

    // --- Calibration ---
    pub battery_curve: CalibrationCurve,
    pub generation_voltage_curve: CalibrationCurve,
    pub generation_current_curve: CalibrationCurve,

    // --- Switching ---
    /// Battery voltage (V) at or below which the bus moves to mains.
    pub battery_low_v: f32,
    /// Recovery margin (V) above `battery_low_v`.
    pub hysteresis_v: f32,
    /// Measure the battery once before choosing the initial source.
    pub startup_probe: bool,

    // --- Relay ---
    /// BCM GPIO number of the source-select relay.
    pub relay_gpio: u8,
    /// Line level that routes the bus to the battery.
    pub relay_battery_level: LineLevel,
    /// Source the relay is parked on at shutdown.
    pub safe_source: PowerSource,

    // --- Timing ---
    /// Poll loop interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            i2c_bus: pins::I2C_BUS,
            voltage_adc_address: pins::VOLTAGE_ADC_ADDR,
            current_adc_address: pins::CURRENT_ADC_ADDR,
            adc: AdcSettings::default(),
            max_read_attempts: 16,

            battery_channel: Channel::Ch1,
            wind_channel: Channel::Ch2,
            solar_channel: Channel::Ch3,
            generation_enabled: true,

            battery_curve: CalibrationCurve::PROTOTYPE,
            generation_voltage_curve: CalibrationCurve::PROTOTYPE,
            generation_current_curve: CalibrationCurve::PROTOTYPE,

            battery_low_v: 12.0,
            hysteresis_v: 1.0,
            startup_probe: true,

            relay_gpio: pins::RELAY_GPIO,
            relay_battery_level: LineLevel::High,
            safe_source: PowerSource::Mains,

            poll_interval_ms: 500,        // 2 Hz
            telemetry_interval_secs: 60, // 1/min
        }
    }
}

impl SystemConfig {
    pub fn thresholds(&self) -> SwitchThresholds {
        SwitchThresholds {
            low_v: self.battery_low_v,
            hysteresis_v: self.hysteresis_v,
        }
    }

    /// Range-check every field.  Out-of-range values are rejected, never
    /// clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ADDRESS_RANGE.contains(&self.voltage_adc_address) {
            return Err(ConfigError::ValidationFailed(
                "voltage_adc_address must be 0x68–0x6F",
            ));
        }
        if !ADDRESS_RANGE.contains(&self.current_adc_address) {
            return Err(ConfigError::ValidationFailed(
                "current_adc_address must be 0x68–0x6F",
            ));
        }
        if self.generation_enabled && self.voltage_adc_address == self.current_adc_address {
            return Err(ConfigError::ValidationFailed(
                "voltage and current converters need distinct addresses",
            ));
        }
        if self.adc.validate().is_err() {
            return Err(ConfigError::ValidationFailed(
                "adc: resolution_bits must be 12/14/16/18, gain 1/2/4/8",
            ));
        }
        if self.max_read_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_read_attempts must be at least 1",
            ));
        }
        if !self.battery_low_v.is_finite() || self.battery_low_v <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "battery_low_v must be a positive voltage",
            ));
        }
        if !self.hysteresis_v.is_finite() || self.hysteresis_v < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "hysteresis_v must be >= 0.0",
            ));
        }
        if self.relay_gpio > 27 {
            return Err(ConfigError::ValidationFailed("relay_gpio must be 0–27"));
        }
        if !(10..=60_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be 10–60000",
            ));
        }
        if !(1..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be 1–3600",
            ));
        }
        Ok(())
    }

    /// Number of poll cycles between telemetry reports (at least one).
    pub fn telemetry_every_ticks(&self) -> u64 {
        let interval_ms = u64::from(self.telemetry_interval_secs) * 1000;
        (interval_ms / u64::from(self.poll_interval_ms.max(1))).max(1)
    }
}
