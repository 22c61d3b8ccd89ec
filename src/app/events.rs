//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::fsm::PowerSource;
use crate::fsm::context::GenerationSnapshot;
use crate::safety::ReadFault;

/// How the initial source was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StartReason {
    /// Startup probe disabled; battery assumed healthy.
    Assumed,
    /// Chosen from a battery reading taken before the first actuation.
    Probed { battery_v: f32 },
    /// The probe read failed; battery assumed healthy.
    ProbeFailed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and the relay has been driven once.
    Started {
        source: PowerSource,
        reason: StartReason,
    },

    /// The controller switched supplies.
    SourceChanged {
        from: PowerSource,
        to: PowerSource,
        battery_v: f32,
    },

    /// A fault was raised.
    FaultDetected(ReadFault),

    /// A fault has cleared.
    FaultCleared(ReadFault),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The relay was released on the safe source at shutdown.
    Stopped {
        /// Source that was active when shutdown began.
        last: PowerSource,
        /// Source the relay was parked on.
        safe: PowerSource,
    },
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub source: PowerSource,
    pub battery_v: f32,
    pub battery_raw: u32,
    pub generation: GenerationSnapshot,
    pub fault_flags: u8,
    /// Control cycles since start.
    pub ticks: u64,
}
