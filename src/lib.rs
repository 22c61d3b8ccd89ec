//! Off-grid 12V source controller.
//!
//! Reads the battery through an MCP3424 converter and moves the bus
//! between battery and mains with a hysteretic two-state machine.  The
//! Raspberry Pi adapters are behind the `rpi` feature; everything else
//! builds and tests on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod logging;
pub mod pins;
pub mod runner;
pub mod safety;
pub mod sensors;
