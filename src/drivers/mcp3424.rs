//! MCP3424 four-channel delta-sigma ADC driver.
//!
//! The chip has a single 8-bit configuration register:
//!
//! ```text
//!   bit   7     6:5      4      3:2         1:0
//!       ┌─────┬───────┬──────┬───────────┬──────┐
//!       │ RDY │ C1 C0 │ O/C  │ S1 S0     │ G1 G0│
//!       └─────┴───────┴──────┴───────────┴──────┘
//!        start  channel  mode  resolution  gain
//! ```
//!
//! Every setter masks out only its own field.  A read selects the channel,
//! addresses the chip, starts a conversion in one-shot mode, then collects
//! the output bytes with a bounded number of block reads.
//!
//! The device does not own the bus: each read borrows it, so the voltage
//! and current converters can share one `/dev/i2c-N` handle.

use log::debug;
use serde::{Deserialize, Serialize};

use super::bus::{SMBUS_BLOCK_MAX, SmbusTransport};
use crate::error::{AdcError, BusError};

const READY_BIT: u8 = 0x80;
const CHANNEL_MASK: u8 = 0x60;
const CHANNEL_SHIFT: u8 = 5;
const MODE_MASK: u8 = 0x10;
const MODE_SHIFT: u8 = 4;
const RESOLUTION_MASK: u8 = 0x0C;
const RESOLUTION_SHIFT: u8 = 2;
const GAIN_MASK: u8 = 0x03;

/// Bytes collected per conversion: up to three data bytes plus the
/// echoed configuration byte.
const OUTPUT_LEN: usize = 4;

/// Lowest and highest address selectable with the Adr0/Adr1 pins.
pub const ADDRESS_RANGE: core::ops::RangeInclusive<u8> = 0x68..=0x6F;

// ---------------------------------------------------------------------------
// Register fields
// ---------------------------------------------------------------------------

/// Input channel.  Datasheet CH1..CH4 map to field values 0..3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Channel {
    Ch1 = 0,
    Ch2 = 1,
    Ch3 = 2,
    Ch4 = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Ch1, Self::Ch2, Self::Ch3, Self::Ch4];
}

impl TryFrom<u8> for Channel {
    type Error = AdcError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ch1),
            1 => Ok(Self::Ch2),
            2 => Ok(Self::Ch3),
            3 => Ok(Self::Ch4),
            _ => Err(AdcError::InvalidConfig("channel must be 0-3")),
        }
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel as u8
    }
}

/// Sample resolution.  Higher resolution means a slower conversion rate
/// (240, 60, 15 and 3.75 samples/s respectively).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
    Bits12 = 0,
    Bits14 = 1,
    Bits16 = 2,
    Bits18 = 3,
}

impl Resolution {
    /// Number of significant bits in a sample.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits12 => 12,
            Self::Bits14 => 14,
            Self::Bits16 => 16,
            Self::Bits18 => 18,
        }
    }

    const fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0 => Self::Bits12,
            1 => Self::Bits14,
            2 => Self::Bits16,
            _ => Self::Bits18,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = AdcError;

    /// Convert a bit count (12, 14, 16 or 18).
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            12 => Ok(Self::Bits12),
            14 => Ok(Self::Bits14),
            16 => Ok(Self::Bits16),
            18 => Ok(Self::Bits18),
            _ => Err(AdcError::InvalidConfig(
                "resolution must be 12, 14, 16 or 18 bits",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConversionMode {
    /// Convert once per request (RDY written as 1 to start).
    OneShot = 0,
    /// Convert back-to-back; a read returns the latest result.
    Continuous = 1,
}

/// Programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gain {
    X1 = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
}

impl Gain {
    pub const fn factor(self) -> u8 {
        1 << (self as u8)
    }

    const fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0 => Self::X1,
            1 => Self::X2,
            2 => Self::X4,
            _ => Self::X8,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = AdcError;

    /// Convert an amplification factor (1, 2, 4 or 8).
    fn try_from(factor: u8) -> Result<Self, Self::Error> {
        match factor {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            _ => Err(AdcError::InvalidConfig("gain must be 1, 2, 4 or 8")),
        }
    }
}

/// Converter settings as they appear in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcSettings {
    /// 12, 14, 16 or 18.
    pub resolution_bits: u8,
    pub conversion_mode: ConversionMode,
    /// 1, 2, 4 or 8.
    pub gain: u8,
}

impl Default for AdcSettings {
    fn default() -> Self {
        Self {
            resolution_bits: 14,
            conversion_mode: ConversionMode::OneShot,
            gain: 1,
        }
    }
}

impl AdcSettings {
    /// Check every field, returning the typed values.
    pub fn validate(&self) -> Result<(Resolution, ConversionMode, Gain), AdcError> {
        let resolution = Resolution::try_from(self.resolution_bits)?;
        let gain = Gain::try_from(self.gain)?;
        Ok((resolution, self.conversion_mode, gain))
    }
}

/// One raw conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSample {
    pub raw: u32,
    pub channel: Channel,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Assemble a raw sample from the output bytes for the given 2-bit
/// resolution field value.
///
/// Values outside 0..=3 are rejected with [`AdcError::InvalidConfig`].
pub fn decode(resolution_field: u8, bytes: &[u8; OUTPUT_LEN]) -> Result<u32, AdcError> {
    let [b0, b1, b2, _] = bytes.map(u32::from);
    match resolution_field {
        0 => Ok(((b0 & 0x0F) << 8) | b1),
        1 => Ok(((b0 & 0x3F) << 8) | b1),
        2 => Ok((b0 << 8) | b1),
        3 => Ok(((b0 & 0x03) << 16) | (b1 << 8) | b2),
        _ => Err(AdcError::InvalidConfig("invalid bit rate")),
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// One MCP3424 at a fixed bus address.
#[derive(Debug, Clone)]
pub struct Mcp3424 {
    address: u8,
    config: u8,
    max_read_attempts: u8,
    last_error: Option<AdcError>,
}

impl Mcp3424 {
    /// Default cap on block reads per sample.
    pub const DEFAULT_READ_ATTEMPTS: u8 = 16;

    /// Create a driver for the chip at `address`, in one-shot mode at the
    /// given resolution, gain ×1, channel 1.
    pub fn new(address: u8, resolution: Resolution) -> Self {
        let mut dev = Self {
            address,
            config: 0x00,
            max_read_attempts: Self::DEFAULT_READ_ATTEMPTS,
            last_error: None,
        };
        dev.set_resolution(resolution);
        dev.set_conversion_mode(ConversionMode::OneShot);
        dev
    }

    /// Override the block-read attempt cap (minimum 1).
    #[must_use]
    pub fn with_max_read_attempts(mut self, attempts: u8) -> Self {
        self.max_read_attempts = attempts.max(1);
        self
    }

    /// Apply resolution, conversion mode and gain in one go.
    ///
    /// All three are validated first; on error the register is unchanged.
    pub fn configure(&mut self, settings: &AdcSettings) -> Result<(), AdcError> {
        let (resolution, mode, gain) = settings.validate()?;
        self.set_resolution(resolution);
        self.set_conversion_mode(mode);
        self.set_gain(gain);
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.set_field(RESOLUTION_MASK, RESOLUTION_SHIFT, resolution as u8);
    }

    pub fn set_conversion_mode(&mut self, mode: ConversionMode) {
        self.set_field(MODE_MASK, MODE_SHIFT, mode as u8);
    }

    pub fn set_gain(&mut self, gain: Gain) {
        self.set_field(GAIN_MASK, 0, gain as u8);
    }

    /// Takes effect on the next read; no bus traffic.
    pub fn select_channel(&mut self, channel: Channel) {
        self.set_field(CHANNEL_MASK, CHANNEL_SHIFT, channel as u8);
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_field(self.field(RESOLUTION_MASK, RESOLUTION_SHIFT))
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        if self.field(MODE_MASK, MODE_SHIFT) == 0 {
            ConversionMode::OneShot
        } else {
            ConversionMode::Continuous
        }
    }

    pub fn gain(&self) -> Gain {
        Gain::from_field(self.field(GAIN_MASK, 0))
    }

    pub fn channel(&self) -> Channel {
        Channel::ALL[self.field(CHANNEL_MASK, CHANNEL_SHIFT) as usize]
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The packed configuration register (RDY bit clear).
    pub fn config_byte(&self) -> u8 {
        self.config
    }

    pub fn max_read_attempts(&self) -> u8 {
        self.max_read_attempts
    }

    /// Error from the most recent read, if it failed.
    pub fn last_error(&self) -> Option<&AdcError> {
        self.last_error.as_ref()
    }

    /// Acquire one sample from `channel`.
    ///
    /// On failure the error is also kept in [`last_error`](Self::last_error);
    /// a successful read clears it.
    pub fn read_raw<B>(&mut self, bus: &mut B, channel: Channel) -> Result<ChannelSample, AdcError>
    where
        B: SmbusTransport + ?Sized,
    {
        let result = self.acquire(bus, channel);
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                debug!("mcp3424@0x{:02x}: {:?} read failed: {}", self.address, channel, e);
                self.last_error = Some(e.clone());
            }
        }
        result
    }

    // -- Internal --

    fn acquire<B>(&mut self, bus: &mut B, channel: Channel) -> Result<ChannelSample, AdcError>
    where
        B: SmbusTransport + ?Sized,
    {
        self.select_channel(channel);

        bus.select_slave(self.address)?;

        if self.conversion_mode() == ConversionMode::OneShot {
            bus.write_byte(self.config | READY_BIT)?;
        }

        let reading = self.read_output(bus)?;
        let raw = decode(self.field(RESOLUTION_MASK, RESOLUTION_SHIFT), &reading)?;
        Ok(ChannelSample { raw, channel })
    }

    /// Accumulate `OUTPUT_LEN` bytes; the bus may deliver fewer per call.
    fn read_output<B>(&self, bus: &mut B) -> Result<[u8; OUTPUT_LEN], BusError>
    where
        B: SmbusTransport + ?Sized,
    {
        let mut reading = [0u8; OUTPUT_LEN];
        let mut block = [0u8; SMBUS_BLOCK_MAX];
        let mut filled = 0;

        for _ in 0..self.max_read_attempts {
            let n = bus.read_block(self.config, &mut block)?.min(block.len());
            let take = n.min(OUTPUT_LEN - filled);
            reading[filled..filled + take].copy_from_slice(&block[..take]);
            filled += take;
            if filled == OUTPUT_LEN {
                return Ok(reading);
            }
        }

        Err(BusError::RetriesExhausted {
            attempts: self.max_read_attempts,
            received: filled,
        })
    }

    fn set_field(&mut self, mask: u8, shift: u8, value: u8) {
        self.config &= !mask;
        self.config |= (value << shift) & mask;
    }

    fn field(&self, mask: u8, shift: u8) -> u8 {
        (self.config & mask) >> shift
    }
}
