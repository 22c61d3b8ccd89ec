//! Bus and GPIO assignments for the Raspberry Pi carrier board.
//!
//! Single source of truth for the defaults in `SystemConfig`.  Every value
//! here can be overridden from the configuration file.

// ---------------------------------------------------------------------------
// I2C
// ---------------------------------------------------------------------------

/// `/dev/i2c-1` on every Pi since revision 2.  Rev 1 boards expose bus 0.
pub const I2C_BUS: u8 = 1;

/// MCP3424 behind the voltage dividers (A0/A1 tied low).
pub const VOLTAGE_ADC_ADDR: u8 = 0x68;
/// MCP3424 behind the current shunts (A0 high).
pub const CURRENT_ADC_ADDR: u8 = 0x69;

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// Source-select relay coil driver (BCM numbering).
pub const RELAY_GPIO: u8 = 11;
