//! Raw-count to physical-unit conversion.
//!
//! Each analog input is a straight line through two calibration points,
//! `(raw_min, physical_min)` and `(raw_max, physical_max)`.  The constants
//! depend on the divider or shunt fitted to a given board revision, so they
//! live in the configuration file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A linear mapping from converter counts to volts (or amps).
///
/// Construction rejects `raw_min == raw_max`, so [`map`](Self::map) never
/// divides by zero.  Deserialization goes through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurvePoints")]
pub struct CalibrationCurve {
    raw_min: u32,
    raw_max: u32,
    physical_min: f32,
    physical_max: f32,
}

/// Unchecked wire form of [`CalibrationCurve`].
#[derive(Deserialize)]
struct CurvePoints {
    raw_min: u32,
    raw_max: u32,
    physical_min: f32,
    physical_max: f32,
}

impl TryFrom<CurvePoints> for CalibrationCurve {
    type Error = ConfigError;

    fn try_from(p: CurvePoints) -> Result<Self, Self::Error> {
        Self::new(p.raw_min, p.raw_max, p.physical_min, p.physical_max)
    }
}

impl CalibrationCurve {
    /// 0–9999 counts over 0–16 V: the divider on the first bench board.
    pub const PROTOTYPE: Self = Self {
        raw_min: 0,
        raw_max: 9999,
        physical_min: 0.0,
        physical_max: 16.0,
    };

    pub fn new(
        raw_min: u32,
        raw_max: u32,
        physical_min: f32,
        physical_max: f32,
    ) -> Result<Self, ConfigError> {
        if raw_min == raw_max {
            return Err(ConfigError::ValidationFailed(
                "calibration raw_min and raw_max must differ",
            ));
        }
        if !physical_min.is_finite() || !physical_max.is_finite() {
            return Err(ConfigError::ValidationFailed(
                "calibration physical range must be finite",
            ));
        }
        Ok(Self {
            raw_min,
            raw_max,
            physical_min,
            physical_max,
        })
    }

    /// Convert a raw sample.  Values outside the raw range extrapolate
    /// along the same line.
    pub fn map(&self, raw: u32) -> f32 {
        // f64 keeps both endpoints exact for any u32 range.
        let t = (f64::from(raw) - f64::from(self.raw_min))
            / (f64::from(self.raw_max) - f64::from(self.raw_min));
        let lo = f64::from(self.physical_min);
        let span = f64::from(self.physical_max) - lo;
        (lo + t * span) as f32
    }

    pub fn raw_range(&self) -> (u32, u32) {
        (self.raw_min, self.raw_max)
    }

    pub fn physical_range(&self) -> (f32, f32) {
        (self.physical_min, self.physical_max)
    }
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self::PROTOTYPE
    }
}
