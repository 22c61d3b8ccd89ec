//! Raspberry Pi peripherals via `rppal`.
//!
//! [`RpiBus`] puts the [`SmbusTransport`] trait on `/dev/i2c-N`, and
//! [`claim_relay_pin`] hands out the relay GPIO as an embedded-hal
//! output pin.

use log::info;
use rppal::gpio::{Gpio, OutputPin};
use rppal::i2c::I2c;

use crate::drivers::bus::SmbusTransport;
use crate::error::BusError;

/// An open `/dev/i2c-N` character device.
pub struct RpiBus {
    i2c: I2c,
}

impl RpiBus {
    pub fn open(bus: u8) -> Result<Self, rppal::i2c::Error> {
        let i2c = I2c::with_bus(bus)?;
        info!("i2c: opened /dev/i2c-{}", bus);
        Ok(Self { i2c })
    }
}

impl SmbusTransport for RpiBus {
    fn select_slave(&mut self, address: u8) -> Result<(), BusError> {
        self.i2c
            .set_slave_address(u16::from(address))
            .map_err(|e| BusError::address(address, e))
    }

    fn write_byte(&mut self, value: u8) -> Result<(), BusError> {
        self.i2c.smbus_send_byte(value).map_err(BusError::write)
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        self.i2c
            .smbus_block_read(register, buf)
            .map_err(BusError::read)
    }
}

/// Claim `gpio` (BCM numbering) as an output for the relay.
///
/// The pin keeps its level when dropped, so the relay stays on the source
/// it was released to after the process exits.
pub fn claim_relay_pin(gpio: u8) -> Result<OutputPin, rppal::gpio::Error> {
    let mut pin = Gpio::new()?.get(gpio)?.into_output();
    pin.set_reset_on_drop(false);
    info!("gpio: relay on BCM {}", gpio);
    Ok(pin)
}
