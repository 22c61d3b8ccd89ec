//! Unified error types for the off-grid controller.
//!
//! A single [`Error`] enum that every subsystem converts into, so the
//! control loop can report any failure uniformly.  Driver-level errors are
//! `Clone` so a device can keep a copy of its last failure.

use core::fmt::{self, Write};

use thiserror::Error;

/// Capacity of the fixed-size detail string carried by bus errors.
pub const ERR_DETAIL_LEN: usize = 96;

/// Transport-supplied detail text (e.g. the OS error string).
pub type ErrorDetail = heapless::String<ERR_DETAIL_LEN>;

/// Render `msg` into an [`ErrorDetail`], truncating at capacity.
pub fn detail(msg: impl fmt::Display) -> ErrorDetail {
    let mut out = ErrorDetail::new();
    let mut full = Truncating(&mut out);
    // Truncating never fails; overflow is dropped.
    let _ = write!(full, "{msg}");
    out
}

struct Truncating<'a>(&'a mut ErrorDetail);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A converter read or configuration failed.
    #[error("adc: {0}")]
    Adc(#[from] AdcError),
    /// The relay line could not be driven.
    #[error("actuator: {0}")]
    Actuator(#[from] ActuatorError),
    /// Configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Transport-level failures on the register-oriented serial bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The device did not acknowledge, or the slave address could not be set.
    #[error("address 0x{address:02x}: {detail}")]
    Address { address: u8, detail: ErrorDetail },
    /// A single-byte write failed.
    #[error("write: {detail}")]
    Write { detail: ErrorDetail },
    /// A block read failed.
    #[error("read: {detail}")]
    Read { detail: ErrorDetail },
    /// The read loop hit its attempt cap before collecting a full sample.
    #[error("read retries exhausted after {attempts} attempts ({received} bytes received)")]
    RetriesExhausted { attempts: u8, received: usize },
}

impl BusError {
    pub fn address(address: u8, msg: impl fmt::Display) -> Self {
        Self::Address {
            address,
            detail: detail(msg),
        }
    }

    pub fn write(msg: impl fmt::Display) -> Self {
        Self::Write {
            detail: detail(msg),
        }
    }

    pub fn read(msg: impl fmt::Display) -> Self {
        Self::Read {
            detail: detail(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// ADC errors
// ---------------------------------------------------------------------------

/// Errors returned by the MCP3424 driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdcError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
    /// Resolution, conversion mode, gain or channel outside its domain.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

impl AdcError {
    pub fn is_bus(&self) -> bool {
        matches!(self, Self::Bus(_))
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// The relay GPIO write failed.
    #[error("relay line write failed ({0:?})")]
    LineWriteFailed(embedded_hal::digital::ErrorKind),
    /// The relay has been released and no longer accepts commands.
    #[error("relay line released")]
    Released,
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations
/// and [`SystemConfig::validate`](crate::config::SystemConfig::validate).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file found (first start).
    #[error("config not found")]
    NotFound,
    /// Stored config could not be parsed.
    #[error("config corrupted: {0}")]
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
