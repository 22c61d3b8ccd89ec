//! Fuzz target: configuration file parsing
//!
//! Any document that deserializes and validates must yield usable
//! thresholds and a calibration curve that hits its own endpoints.
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use offgrid::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<SystemConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let t = config.thresholds();
    assert!(t.recover_v() >= t.low_v);
    let (raw_min, _) = config.battery_curve.raw_range();
    let (v_min, _) = config.battery_curve.physical_range();
    assert_eq!(config.battery_curve.map(raw_min), v_min);
    assert!(config.telemetry_every_ticks() >= 1);
});
