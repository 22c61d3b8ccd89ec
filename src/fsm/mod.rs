//! Function-pointer finite state machine for source selection.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ State   │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Battery │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Mains   │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the current state.  If it
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next.  `on_enter` is where the relay command is
//! queued, so a command is produced once per transition and never while
//! the state holds.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Which supply feeds the 12V bus.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PowerSource {
    Battery = 0,
    Mains = 1,
}

impl PowerSource {
    /// Number of states; sizes the table array.
    pub const COUNT: usize = 2;

    /// Convert a table index back to a state.  Out-of-range indices are a
    /// bug; release builds fall back to `Mains`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Battery,
            1 => Self::Mains,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Mains
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick handler.  Returns `Some(next)` to transition, `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<PowerSource>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: PowerSource,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `PowerSource as usize`.
    table: [StateDescriptor; PowerSource::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
    transitions: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; PowerSource::COUNT], initial: PowerSource) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one control cycle.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.force_transition(next_id, ctx);
        }
    }

    /// Transition immediately (no-op if already in `next`).
    pub fn force_transition(&mut self, next: PowerSource, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> PowerSource {
        PowerSource::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    /// Number of transitions since construction.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    fn transition(&mut self, next_id: PowerSource, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        self.transitions += 1;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
