//! Integration tests for the AppService → FSM → relay pipeline.
//!
//! The real `HardwareAdapter`, `SensorHub` and `RelayDriver` run over the
//! scripted bus and recording pin, so every test covers the path from raw
//! converter bytes to a GPIO level.

use embedded_hal::digital::PinState;

use offgrid::app::events::{AppEvent, StartReason};
use offgrid::app::service::{AppService, Decision};
use offgrid::config::SystemConfig;
use offgrid::drivers::relay::{LineLevel, RelayState};
use offgrid::error::{ActuatorError, Error};
use offgrid::fsm::PowerSource;
use offgrid::safety::ReadFault;

use crate::mock_hw::{BusOp, MockBus, RecordingSink, rig, set_battery, test_config};

fn tick_at(
    app: &mut AppService,
    hw: &mut crate::mock_hw::Rig,
    bus: &MockBus,
    cfg: &SystemConfig,
    sink: &mut RecordingSink,
    volts: f32,
) -> Result<Decision, Error> {
    set_battery(bus, cfg, volts);
    app.tick(hw, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn healthy_battery_starts_on_battery_and_drives_line_high() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 12.6);

    let mut app = AppService::new(&cfg);
    assert_eq!(app.start(&mut hw, &mut sink), PowerSource::Battery);

    assert_eq!(pin.levels(), vec![PinState::High]);
    assert_eq!(hw.relay_state(), RelayState::Selected(PowerSource::Battery));
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::Started {
            source: PowerSource::Battery,
            reason: StartReason::Probed { .. }
        })
    ));
}

#[test]
fn flat_battery_at_start_goes_straight_to_mains() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 11.0);

    let mut app = AppService::new(&cfg);
    assert_eq!(app.start(&mut hw, &mut sink), PowerSource::Mains);
    assert_eq!(pin.levels(), vec![PinState::Low]);
    assert_eq!(app.transitions(), 0);
}

#[test]
fn probe_disabled_assumes_battery_without_reading() {
    let cfg = SystemConfig {
        startup_probe: false,
        ..test_config()
    };
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();

    let mut app = AppService::new(&cfg);
    assert_eq!(app.start(&mut hw, &mut sink), PowerSource::Battery);
    assert!(bus.log().is_empty());
    assert_eq!(pin.levels(), vec![PinState::High]);
}

// ── Hysteresis through real hardware path ─────────────────────

#[test]
fn voltage_sequence_ends_on_mains() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    for v in [13.0, 11.5, 12.5] {
        tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, v).unwrap();
    }
    assert_eq!(app.source(), PowerSource::Mains);
    assert_eq!(pin.levels(), vec![PinState::High, PinState::Low]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SourceChanged { .. })),
        1
    );
}

#[test]
fn exact_threshold_values_switch() {
    let cfg = test_config();
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 12.5);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    assert_eq!(
        tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 12.0).unwrap(),
        Decision::Switched {
            from: PowerSource::Battery,
            to: PowerSource::Mains
        }
    );
    assert_eq!(
        tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 13.0).unwrap(),
        Decision::Switched {
            from: PowerSource::Mains,
            to: PowerSource::Battery
        }
    );
}

#[test]
fn inverted_polarity_drives_low_for_battery() {
    let cfg = SystemConfig {
        relay_battery_level: LineLevel::Low,
        ..test_config()
    };
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);
    tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 11.0).unwrap();

    assert_eq!(pin.levels(), vec![PinState::Low, PinState::High]);
}

// ── Fail-safe hold ────────────────────────────────────────────

#[test]
fn nack_holds_source_and_skips_relay() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    bus.set_offline(cfg.voltage_adc_address, true);
    for _ in 0..5 {
        let err = app.tick(&mut hw, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Adc(_)));
    }
    assert_eq!(app.source(), PowerSource::Battery);
    assert_eq!(pin.levels(), vec![PinState::High]);
    assert_eq!(
        sink.count(|e| *e == AppEvent::FaultDetected(ReadFault::BatteryRead)),
        1
    );
    assert!(hw.sensor_hub().voltage_adc().last_error().is_some());

    bus.set_offline(cfg.voltage_adc_address, false);
    set_battery(&bus, &cfg, 11.0);
    app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(app.source(), PowerSource::Mains);
    assert_eq!(
        sink.count(|e| *e == AppEvent::FaultCleared(ReadFault::BatteryRead)),
        1
    );
}

#[test]
fn generation_failure_does_not_affect_decision() {
    let cfg = test_config();
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    bus.set_offline(cfg.current_adc_address, true);
    let d = tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 11.0).unwrap();
    assert_eq!(
        d,
        Decision::Switched {
            from: PowerSource::Battery,
            to: PowerSource::Mains
        }
    );
    assert_eq!(
        app.fault_flags(),
        ReadFault::GenerationRead.mask()
    );
}

#[test]
fn generation_values_reach_telemetry() {
    let cfg = test_config();
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    bus.set_count(cfg.voltage_adc_address, cfg.wind_channel as u8, 9999);
    bus.set_count(cfg.current_adc_address, cfg.solar_channel as u8, 9999);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);
    app.tick(&mut hw, &mut sink).unwrap();

    let t = app.build_telemetry();
    assert_eq!(t.source, PowerSource::Battery);
    assert_eq!(t.battery_v, 13.0);
    assert_eq!(t.battery_raw, 1300);
    assert_eq!(t.generation.wind.volts, 16.0);
    assert_eq!(t.generation.solar.amps, 16.0);
    assert_eq!(t.ticks, 1);
}

#[test]
fn generation_disabled_only_touches_voltage_converter() {
    let cfg = SystemConfig {
        generation_enabled: false,
        ..test_config()
    };
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);
    bus.clear_log();

    app.tick(&mut hw, &mut sink).unwrap();
    assert!(
        bus.log()
            .iter()
            .all(|op| *op != BusOp::Select(cfg.current_adc_address))
    );
}

// ── Relay failures and shutdown ───────────────────────────────

#[test]
fn relay_failure_is_retried_next_cycle() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    pin.set_failing(true);
    let err = tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 11.0).unwrap_err();
    assert!(matches!(
        err,
        Error::Actuator(ActuatorError::LineWriteFailed(_))
    ));
    assert_eq!(app.source(), PowerSource::Mains);
    assert_eq!(app.pending_relay(), Some(PowerSource::Mains));

    pin.set_failing(false);
    tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 11.0).unwrap();
    assert_eq!(pin.levels(), vec![PinState::High, PinState::Low]);
    assert_eq!(
        sink.count(|e| *e == AppEvent::FaultCleared(ReadFault::RelayWrite)),
        1
    );
}

#[test]
fn shutdown_parks_relay_on_safe_source() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    app.shutdown(&mut hw, &mut sink).unwrap();
    assert_eq!(hw.relay_state(), RelayState::Released(PowerSource::Mains));
    assert_eq!(pin.levels(), vec![PinState::High, PinState::Low]);
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::Stopped {
            last: PowerSource::Battery,
            safe: PowerSource::Mains
        })
    );

    // Nothing moves the relay after release.
    let err = tick_at(&mut app, &mut hw, &bus, &cfg, &mut sink, 11.0).unwrap_err();
    assert!(matches!(err, Error::Actuator(ActuatorError::Released)));
    assert_eq!(pin.levels().len(), 2);
}
