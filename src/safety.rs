//! Read-fault supervisor.
//!
//! The service reports the outcome of every battery read, generation read
//! and relay write.  The supervisor keeps a fault bitmask that is copied
//! into `FsmContext.fault_flags` and reported in telemetry.
//!
//! ## Fault lifecycle
//!
//! 1. An operation fails.  The supervisor sets the bit and returns
//!    [`FaultChange::Raised`] the first time, so exactly one
//!    `FaultDetected` event is emitted however long the fault lasts.
//! 2. Each further failure only bumps the consecutive-failure counter.
//! 3. The next success clears the bit and returns
//!    [`FaultChange::Cleared`].
//!
//! Faults never drive a state transition.  A failed battery read makes
//! the service hold its current source instead.

use core::fmt;

use log::{error, info};
use serde::Serialize;

/// Individual faults, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ReadFault {
    /// Battery voltage could not be read; the source decision is on hold.
    BatteryRead = 0b0000_0001,
    /// A wind or solar V/I read failed; telemetry is stale.
    GenerationRead = 0b0000_0010,
    /// The relay line could not be driven.
    RelayWrite = 0b0000_0100,
}

impl ReadFault {
    pub const ALL: [ReadFault; 3] = [Self::BatteryRead, Self::GenerationRead, Self::RelayWrite];

    pub const fn mask(self) -> u8 {
        self as u8
    }

    const fn slot(self) -> usize {
        match self {
            Self::BatteryRead => 0,
            Self::GenerationRead => 1,
            Self::RelayWrite => 2,
        }
    }
}

impl fmt::Display for ReadFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatteryRead => write!(f, "battery read failed"),
            Self::GenerationRead => write!(f, "generation read failed"),
            Self::RelayWrite => write!(f, "relay write failed"),
        }
    }
}

/// Edge reported by [`ReadFaultSupervisor::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultChange {
    Raised(ReadFault),
    Cleared(ReadFault),
}

#[derive(Debug, Default)]
pub struct ReadFaultSupervisor {
    /// Latched fault bitmask.
    faults: u8,
    /// Consecutive failures per fault, indexed by `ReadFault::slot`.
    streaks: [u32; 3],
}

impl ReadFaultSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one operation guarded by `fault`.
    pub fn record(&mut self, fault: ReadFault, failed: bool) -> Option<FaultChange> {
        let slot = fault.slot();
        let was_set = self.has_fault(fault);
        if failed {
            self.streaks[slot] = self.streaks[slot].saturating_add(1);
            self.faults |= fault.mask();
            if !was_set {
                error!("FAULT SET: {fault}");
                return Some(FaultChange::Raised(fault));
            }
        } else {
            self.faults &= !fault.mask();
            if was_set {
                info!(
                    "FAULT CLEARED: {fault} after {} consecutive failures",
                    self.streaks[slot]
                );
                self.streaks[slot] = 0;
                return Some(FaultChange::Cleared(fault));
            }
        }
        None
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: ReadFault) -> bool {
        self.faults & fault.mask() != 0
    }

    pub fn consecutive_failures(&self, fault: ReadFault) -> u32 {
        self.streaks[fault.slot()]
    }
}
