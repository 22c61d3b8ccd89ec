//! Concrete state handler functions and table builder.
//!
//! ```text
//!            [v <= LOW]
//!   BATTERY ────────────▶ MAINS
//!      ▲                    │
//!      └────────────────────┘
//!        [v >= LOW + HYSTERESIS]
//! ```
//!
//! Readings strictly between `LOW` and `LOW + HYSTERESIS` never change the
//! state, whichever side it was entered from.

use super::context::FsmContext;
use super::{PowerSource, StateDescriptor};
use log::{info, warn};

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; PowerSource::COUNT] {
    [
        // Index 0: Battery
        StateDescriptor {
            id: PowerSource::Battery,
            name: "Battery",
            on_enter: Some(battery_enter),
            on_exit: None,
            on_update: battery_update,
        },
        // Index 1: Mains
        StateDescriptor {
            id: PowerSource::Mains,
            name: "Mains",
            on_enter: Some(mains_enter),
            on_exit: None,
            on_update: mains_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BATTERY state
// ═══════════════════════════════════════════════════════════════════════════

fn battery_enter(ctx: &mut FsmContext) {
    ctx.commands.relay = Some(PowerSource::Battery);
    info!("BATTERY: bus on battery at {:.2} V", ctx.sensors.battery_v);
}

fn battery_update(ctx: &mut FsmContext) -> Option<PowerSource> {
    let low = ctx.thresholds.low_v;
    if ctx.sensors.battery_v <= low {
        warn!(
            "BATTERY: {:.2} V <= {:.2} V low threshold → mains",
            ctx.sensors.battery_v, low
        );
        return Some(PowerSource::Mains);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MAINS state: battery recovering
// ═══════════════════════════════════════════════════════════════════════════

fn mains_enter(ctx: &mut FsmContext) {
    ctx.commands.relay = Some(PowerSource::Mains);
    info!(
        "MAINS: bus on mains, battery must reach {:.2} V to return",
        ctx.thresholds.recover_v()
    );
}

fn mains_update(ctx: &mut FsmContext) -> Option<PowerSource> {
    let recover = ctx.thresholds.recover_v();
    if ctx.sensors.battery_v >= recover {
        info!(
            "MAINS: battery recovered to {:.2} V after {:.0}s → battery",
            ctx.sensors.battery_v,
            ctx.secs_in_state()
        );
        return Some(PowerSource::Battery);
    }
    None
}
