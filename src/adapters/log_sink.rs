//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stdout or journald, depending on the subscriber).

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | source={:?} | battery={:.2}V (raw {}) | \
                     wind={:.2}V/{:.2}A | solar={:.2}V/{:.2}A | \
                     faults=0b{:08b} | ticks={}",
                    t.source,
                    t.battery_v,
                    t.battery_raw,
                    t.generation.wind.volts,
                    t.generation.wind.amps,
                    t.generation.solar.volts,
                    t.generation.solar.amps,
                    t.fault_flags,
                    t.ticks,
                );
            }
            AppEvent::SourceChanged {
                from,
                to,
                battery_v,
            } => {
                info!("SOURCE | {:?} -> {:?} at {:.2}V", from, to, battery_v);
            }
            AppEvent::FaultDetected(fault) => {
                error!("FAULT | detected: {fault}");
            }
            AppEvent::FaultCleared(fault) => {
                info!("FAULT | cleared: {fault}");
            }
            AppEvent::Started { source, reason } => {
                info!("START | initial_source={:?} reason={:?}", source, reason);
            }
            AppEvent::Stopped { last, safe } => {
                info!("STOP | last_source={:?} released_to={:?}", last, safe);
            }
        }
    }
}
