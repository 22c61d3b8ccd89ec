//! Application core: domain logic with no I/O of its own.
//!
//! This module contains the business rules for the off-grid controller:
//! FSM orchestration, fail-safe hold on read errors, and fault tracking.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
