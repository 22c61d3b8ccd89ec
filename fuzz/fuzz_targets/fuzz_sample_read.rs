//! Fuzz target: `Mcp3424::read_raw`
//!
//! The first byte picks resolution and channel, the second caps the number
//! of block reads.  The rest is served to the driver as bus replies: each
//! reply is a length byte followed by that many payload bytes.  The driver
//! must never panic, must return a sample that fits its resolution, and
//! must give up after the configured number of reads.
//!
//! cargo fuzz run fuzz_sample_read

#![no_main]

use libfuzzer_sys::fuzz_target;
use offgrid::drivers::bus::SmbusTransport;
use offgrid::drivers::mcp3424::{Channel, Mcp3424, Resolution};
use offgrid::error::BusError;

struct ReplayBus<'a> {
    data: &'a [u8],
    reads: usize,
}

impl SmbusTransport for ReplayBus<'_> {
    fn select_slave(&mut self, _address: u8) -> Result<(), BusError> {
        Ok(())
    }

    fn write_byte(&mut self, _value: u8) -> Result<(), BusError> {
        Ok(())
    }

    fn read_block(&mut self, _register: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        self.reads += 1;
        let Some((&len, rest)) = self.data.split_first() else {
            return Err(BusError::read("replay exhausted"));
        };
        // Lengths beyond the buffer are passed through unclamped.
        let n = usize::from(len).min(rest.len()).min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.data = &rest[n..];
        Ok(usize::from(len).min(rest.len()))
    }
}

fuzz_target!(|data: &[u8]| {
    let [setup, attempts, replies @ ..] = data else {
        return;
    };
    let resolution = [
        Resolution::Bits12,
        Resolution::Bits14,
        Resolution::Bits16,
        Resolution::Bits18,
    ][usize::from(setup & 0x03)];
    let channel = Channel::ALL[usize::from((setup >> 2) & 0x03)];

    let mut adc = Mcp3424::new(0x68, resolution).with_max_read_attempts(*attempts);
    let mut bus = ReplayBus {
        data: replies,
        reads: 0,
    };

    if let Ok(sample) = adc.read_raw(&mut bus, channel) {
        assert!(sample.raw < (1 << resolution.bits()));
        assert_eq!(sample.channel, channel);
    }
    assert!(bus.reads <= usize::from(adc.max_read_attempts()));
});
