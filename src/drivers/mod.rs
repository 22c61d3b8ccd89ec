//! Peripheral drivers: the bus abstraction, the MCP3424 converter, and the
//! source-select relay.

pub mod bus;
pub mod mcp3424;
pub mod relay;
