//! Poll loop under paused tokio time.

use std::time::Duration;

use embedded_hal::digital::PinState;
use tokio_util::sync::CancellationToken;

use offgrid::app::events::AppEvent;
use offgrid::app::service::AppService;
use offgrid::config::SystemConfig;
use offgrid::fsm::PowerSource;
use offgrid::runner::{self, Cadence, RunSummary};

use crate::mock_hw::{RecordingSink, rig, set_battery, test_config};

fn cadence(every: u64) -> Cadence {
    Cadence {
        poll: Duration::from_millis(500),
        telemetry_every: every,
    }
}

fn telemetry_count(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::Telemetry(_)))
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_loop_between_cycles() {
    let cfg = test_config();
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    let cancel = CancellationToken::new();
    let stopper = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(1250)).await;
            cancel.cancel();
        }
    };

    // Cycles at t = 0, 500, 1000; cancelled while sleeping towards 1500.
    let (summary, ()) = tokio::join!(
        runner::run(&mut app, &mut hw, &mut sink, cadence(1000), &cancel),
        stopper
    );
    assert_eq!(
        summary,
        RunSummary {
            cycles: 3,
            held_cycles: 0,
            relay_failures: 0
        }
    );
    assert_eq!(app.tick_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_runs_no_cycles() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = runner::run(&mut app, &mut hw, &mut sink, cadence(1), &cancel).await;

    assert_eq!(summary.cycles, 0);
    assert_eq!(pin.levels(), vec![PinState::High]);
}

#[tokio::test(start_paused = true)]
async fn telemetry_every_n_cycles() {
    let cfg = test_config();
    let (mut hw, bus, _pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);

    let cancel = CancellationToken::new();
    let stopper = {
        let cancel = cancel.clone();
        async move {
            // Seven cycles: t = 0 .. 3000.
            tokio::time::sleep(Duration::from_millis(3250)).await;
            cancel.cancel();
        }
    };
    let (summary, ()) = tokio::join!(
        runner::run(&mut app, &mut hw, &mut sink, cadence(3), &cancel),
        stopper
    );

    assert_eq!(summary.cycles, 7);
    assert_eq!(telemetry_count(&sink), 2);
    let Some(AppEvent::Telemetry(t)) = sink
        .events
        .iter()
        .rev()
        .find(|e| matches!(e, AppEvent::Telemetry(_)))
    else {
        panic!("no telemetry emitted");
    };
    assert_eq!(t.ticks, 6);
    assert_eq!(t.battery_v, 13.0);
}

#[tokio::test(start_paused = true)]
async fn offline_converter_counts_held_cycles() {
    let cfg = test_config();
    let (mut hw, bus, pin) = rig(&cfg);
    let mut sink = RecordingSink::new();
    set_battery(&bus, &cfg, 13.0);
    let mut app = AppService::new(&cfg);
    app.start(&mut hw, &mut sink);
    bus.set_offline(cfg.voltage_adc_address, true);

    let cancel = CancellationToken::new();
    let stopper = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(750)).await;
            cancel.cancel();
        }
    };
    let (summary, ()) = tokio::join!(
        runner::run(&mut app, &mut hw, &mut sink, cadence(100), &cancel),
        stopper
    );

    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.held_cycles, 2);
    assert_eq!(app.source(), PowerSource::Battery);
    assert_eq!(pin.levels(), vec![PinState::High]);
}

#[test]
fn cadence_from_default_config() {
    let c = Cadence::from_config(&SystemConfig::default());
    assert_eq!(c.poll, Duration::from_millis(500));
    assert_eq!(c.telemetry_every, 120);
}
