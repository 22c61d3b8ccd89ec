//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the FSM, the read-fault supervisor, and the shared
//! context.  It exposes a hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      AppService         │
//! ActuatorPort ◀──│  FSM · Fault supervisor │
//!                 └────────────────────────┘
//! ```
//!
//! ## Fail-safe hold
//!
//! When the battery read fails the cycle is skipped: the FSM is not
//! ticked, the relay is not touched, and the error is returned to the
//! caller.  The source stays whatever it was.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{ActuatorError, Result};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, PowerSource};
use crate::safety::{FaultChange, ReadFault, ReadFaultSupervisor};

use super::events::{AppEvent, StartReason, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort};

/// Outcome of one successful control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The reading did not cross a threshold.
    Hold(PowerSource),
    /// The reading crossed a threshold and the relay was moved.
    Switched { from: PowerSource, to: PowerSource },
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    supervisor: ReadFaultSupervisor,
    generation_enabled: bool,
    startup_probe: bool,
    safe_source: PowerSource,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        let tick_secs = config.poll_interval_ms as f32 / 1000.0;
        Self {
            fsm: Fsm::new(build_state_table(), PowerSource::Battery),
            ctx: FsmContext::new(config.thresholds(), tick_secs),
            supervisor: ReadFaultSupervisor::new(),
            generation_enabled: config.generation_enabled,
            startup_probe: config.startup_probe,
            safe_source: config.safe_source,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Pick the initial source and drive the relay to it once.
    ///
    /// A failed initial relay write raises [`ReadFault::RelayWrite`]; the
    /// command stays pending and is retried on the next tick.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> PowerSource {
        let (initial, reason) = self.probe(hw, sink);

        self.fsm = Fsm::new(build_state_table(), initial);
        self.fsm.start(&mut self.ctx);
        if let Err(e) = self.apply_pending(hw, sink) {
            warn!("initial relay write failed, will retry: {e}");
        }

        sink.emit(&AppEvent::Started {
            source: initial,
            reason,
        });
        info!("AppService started on {:?} ({:?})", initial, reason);
        initial
    }

    /// Park the relay on the configured safe source.
    pub fn shutdown(
        &mut self,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), ActuatorError> {
        let last = self.fsm.current_state();
        info!(
            "AppService stopping after {} cycles, releasing relay to {:?}",
            self.tick_count, self.safe_source
        );
        hw.release(self.safe_source)?;
        sink.emit(&AppEvent::Stopped {
            last,
            safe: self.safe_source,
        });
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read → decide → actuate.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`].
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<Decision> {
        self.tick_count += 1;
        let prev = self.fsm.current_state();

        // 1. Battery, which gates the decision.
        let battery = hw.read_battery();
        self.note(ReadFault::BatteryRead, battery.is_err(), sink);

        // 2. Generation telemetry, best effort.
        if self.generation_enabled {
            match hw.read_generation() {
                Ok(g) => {
                    self.ctx.sensors.generation = g;
                    self.note(ReadFault::GenerationRead, false, sink);
                }
                Err(e) => {
                    warn!("generation read failed, keeping last values: {e}");
                    self.note(ReadFault::GenerationRead, true, sink);
                }
            }
        }

        let battery = match battery {
            Ok(r) => r,
            Err(e) => {
                warn!("battery read failed, holding {:?}: {e}", prev);
                return Err(e.into());
            }
        };
        self.ctx.sensors.battery_v = battery.volts;
        self.ctx.sensors.battery_raw = battery.raw;

        // 3. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        let now = self.fsm.current_state();
        if now != prev {
            sink.emit(&AppEvent::SourceChanged {
                from: prev,
                to: now,
                battery_v: battery.volts,
            });
        }

        // 4. Apply the relay command, if any
        self.apply_pending(hw, sink)?;

        Ok(if now != prev {
            Decision::Switched { from: prev, to: now }
        } else {
            Decision::Hold(now)
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            source: self.fsm.current_state(),
            battery_v: self.ctx.sensors.battery_v,
            battery_raw: self.ctx.sensors.battery_raw,
            generation: self.ctx.sensors.generation,
            fault_flags: self.ctx.fault_flags,
            ticks: self.tick_count,
        }
    }

    /// Currently selected source.
    pub fn source(&self) -> PowerSource {
        self.fsm.current_state()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    /// Number of source switches since start.
    pub fn transitions(&self) -> u64 {
        self.fsm.transitions()
    }

    /// Relay command produced by a transition but not yet applied.
    pub fn pending_relay(&self) -> Option<PowerSource> {
        self.ctx.commands.relay
    }

    // ── Internal ──────────────────────────────────────────────

    fn probe(
        &mut self,
        hw: &mut impl SensorPort,
        sink: &mut impl EventSink,
    ) -> (PowerSource, StartReason) {
        if !self.startup_probe {
            return (PowerSource::Battery, StartReason::Assumed);
        }
        match hw.read_battery() {
            Ok(r) => {
                self.note(ReadFault::BatteryRead, false, sink);
                self.ctx.sensors.battery_v = r.volts;
                self.ctx.sensors.battery_raw = r.raw;
                let source = if r.volts <= self.ctx.thresholds.low_v {
                    PowerSource::Mains
                } else {
                    PowerSource::Battery
                };
                (source, StartReason::Probed { battery_v: r.volts })
            }
            Err(e) => {
                warn!("startup probe failed, assuming battery: {e}");
                self.note(ReadFault::BatteryRead, true, sink);
                (PowerSource::Battery, StartReason::ProbeFailed)
            }
        }
    }

    /// Drive the relay for the pending command.  The command is cleared
    /// only once the write succeeds.
    fn apply_pending(
        &mut self,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), ActuatorError> {
        let Some(source) = self.ctx.commands.relay else {
            return Ok(());
        };
        let result = hw.select_source(source);
        self.note(ReadFault::RelayWrite, result.is_err(), sink);
        result?;
        self.ctx.commands.relay = None;
        Ok(())
    }

    fn note(&mut self, fault: ReadFault, failed: bool, sink: &mut impl EventSink) {
        match self.supervisor.record(fault, failed) {
            Some(FaultChange::Raised(f)) => sink.emit(&AppEvent::FaultDetected(f)),
            Some(FaultChange::Cleared(f)) => sink.emit(&AppEvent::FaultCleared(f)),
            None => {}
        }
        self.ctx.fault_flags = self.supervisor.faults();
    }
}
