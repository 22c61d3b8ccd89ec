//! The poll loop.
//!
//! One cycle every `poll_interval_ms`: tick the service, emit telemetry
//! every N cycles, then sleep.  The loop checks its cancellation token
//! before each cycle and while sleeping, so a signal never interrupts a
//! cycle halfway through a bus transaction.

use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink, SensorPort};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::error::Error;

/// Loop timing derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub poll: Duration,
    /// Emit telemetry every this many cycles (at least 1).
    pub telemetry_every: u64,
}

impl Cadence {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            poll: Duration::from_millis(u64::from(config.poll_interval_ms)),
            telemetry_every: config.telemetry_every_ticks(),
        }
    }
}

/// What happened while the loop ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    /// Cycles skipped because the battery could not be read.
    pub held_cycles: u64,
    pub relay_failures: u64,
}

/// Run until `cancel` fires.  The caller releases the relay afterwards.
pub async fn run<H, S>(
    app: &mut AppService,
    hw: &mut H,
    sink: &mut S,
    cadence: Cadence,
    cancel: &CancellationToken,
) -> RunSummary
where
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    let every = cadence.telemetry_every.max(1);
    let mut summary = RunSummary::default();
    info!(
        "poll loop: every {:?}, telemetry every {} cycles",
        cadence.poll, every
    );

    while !cancel.is_cancelled() {
        match app.tick(hw, sink) {
            Ok(decision) => debug!("cycle {}: {:?}", summary.cycles + 1, decision),
            Err(Error::Adc(_)) => summary.held_cycles += 1,
            Err(Error::Actuator(e)) => {
                summary.relay_failures += 1;
                warn!("relay command not applied, retrying next cycle: {e}");
            }
            Err(e) => warn!("cycle failed: {e}"),
        }
        summary.cycles += 1;

        if summary.cycles % every == 0 {
            sink.emit(&AppEvent::Telemetry(app.build_telemetry()));
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(cadence.poll) => {}
        }
    }

    info!(
        "poll loop stopped: {} cycles, {} held, {} relay failures",
        summary.cycles, summary.held_cycles, summary.relay_failures
    );
    summary
}
