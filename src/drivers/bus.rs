//! Register-oriented serial bus abstraction (SMBus-style).
//!
//! The MCP3424 driver speaks to the chip only through this trait, so the
//! same driver runs against `/dev/i2c-N` on the Pi and against scripted
//! transports in tests.  Acquiring and releasing the bus is the owner's job;
//! the driver never opens or closes it.

use crate::error::BusError;

/// Largest payload an SMBus block read can return.
pub const SMBUS_BLOCK_MAX: usize = 32;

pub trait SmbusTransport {
    /// Address the device at `address` for the following transfers.
    fn select_slave(&mut self, address: u8) -> Result<(), BusError>;

    /// Send a single byte to the addressed device.
    fn write_byte(&mut self, value: u8) -> Result<(), BusError>;

    /// Issue a block read with `register` as the command byte.
    ///
    /// Returns how many bytes were written into `buf`; this may be fewer
    /// than requested, including zero.
    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, BusError>;
}

impl<T: SmbusTransport + ?Sized> SmbusTransport for &mut T {
    fn select_slave(&mut self, address: u8) -> Result<(), BusError> {
        (**self).select_slave(address)
    }

    fn write_byte(&mut self, value: u8) -> Result<(), BusError> {
        (**self).write_byte(value)
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        (**self).read_block(register, buf)
    }
}
