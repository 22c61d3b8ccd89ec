//! Mock hardware for integration tests.
//!
//! Records every bus transaction and relay write so tests can assert on
//! the full history without touching `/dev/i2c-N` or GPIO.  State lives
//! behind `Rc<RefCell<_>>` so a test keeps a handle after the mock has
//! been moved into the sensor hub or relay driver.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, PinState};

use offgrid::adapters::hardware::HardwareAdapter;
use offgrid::app::events::AppEvent;
use offgrid::app::ports::EventSink;
use offgrid::config::SystemConfig;
use offgrid::drivers::bus::SmbusTransport;
use offgrid::drivers::relay::RelayDriver;
use offgrid::error::BusError;
use offgrid::sensors::SensorHub;
use offgrid::sensors::calibration::CalibrationCurve;

// ── Bus ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Select(u8),
    Write(u8),
    Read(u8),
}

#[derive(Default)]
pub struct BusState {
    /// Raw count answered for each (address, channel field).
    pub counts: HashMap<(u8, u8), u32>,
    /// Addresses that NACK.
    pub offline: HashSet<u8>,
    /// Every block read returns zero bytes.
    pub starve: bool,
    /// Split every read into chunks of this many bytes (0 = whole).
    pub chunk: usize,
    pub log: Vec<BusOp>,
    selected: Option<u8>,
    /// Bytes still owed from a chunked read.
    pending: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockBus(pub Rc<RefCell<BusState>>);

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self, address: u8, channel: u8, raw: u32) {
        self.0.borrow_mut().counts.insert((address, channel), raw);
    }

    pub fn set_offline(&self, address: u8, offline: bool) {
        let mut s = self.0.borrow_mut();
        if offline {
            s.offline.insert(address);
        } else {
            s.offline.remove(&address);
        }
    }

    pub fn log(&self) -> Vec<BusOp> {
        self.0.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    pub fn reads(&self) -> usize {
        self.log().iter().filter(|op| matches!(op, BusOp::Read(_))).count()
    }
}

/// Output bytes for `raw` as the chip would send them for `config`.
fn encode(raw: u32, config: u8) -> [u8; 4] {
    if (config & 0x0C) >> 2 == 3 {
        [(raw >> 16) as u8 & 0x03, (raw >> 8) as u8, raw as u8, config]
    } else {
        [(raw >> 8) as u8, raw as u8, config, config]
    }
}

impl SmbusTransport for MockBus {
    fn select_slave(&mut self, address: u8) -> Result<(), BusError> {
        let mut s = self.0.borrow_mut();
        s.log.push(BusOp::Select(address));
        if s.offline.contains(&address) {
            s.selected = None;
            return Err(BusError::address(address, "Remote I/O error (os error 121)"));
        }
        s.selected = Some(address);
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<(), BusError> {
        self.0.borrow_mut().log.push(BusOp::Write(value));
        Ok(())
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        let mut s = self.0.borrow_mut();
        s.log.push(BusOp::Read(register));
        if s.starve {
            return Ok(0);
        }
        let Some(address) = s.selected else {
            return Err(BusError::read("no slave selected"));
        };

        if s.pending.is_empty() {
            let channel = (register & 0x60) >> 5;
            let raw = s.counts.get(&(address, channel)).copied().unwrap_or(0);
            s.pending = encode(raw, register).to_vec();
        }
        let n = match s.chunk {
            0 => s.pending.len(),
            c => c.min(s.pending.len()),
        }
        .min(buf.len());
        let chunk: Vec<u8> = s.pending.drain(..n).collect();
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}

// ── Relay pin ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
pub struct PinLog {
    pub levels: Vec<PinState>,
    pub fail: bool,
}

#[derive(Clone, Default)]
pub struct MockPin(pub Rc<RefCell<PinLog>>);

#[allow(dead_code)]
impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<PinState> {
        self.0.borrow().levels.clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.set_state(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.set_state(PinState::High)
    }

    fn set_state(&mut self, state: PinState) -> Result<(), PinFault> {
        let mut p = self.0.borrow_mut();
        if p.fail {
            return Err(PinFault);
        }
        p.levels.push(state);
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// 100 counts per volt, so whole-count voltages convert exactly.
pub const COUNTS_PER_VOLT: f32 = 100.0;

pub fn counts(volts: f32) -> u32 {
    (volts * COUNTS_PER_VOLT).round() as u32
}

/// Default config with the exact battery curve.
pub fn test_config() -> SystemConfig {
    SystemConfig {
        battery_curve: CalibrationCurve::new(0, 1600, 0.0, 16.0).unwrap(),
        ..SystemConfig::default()
    }
}

pub type Rig = HardwareAdapter<MockBus, MockPin>;

/// Hardware adapter over mocks, plus handles to inspect them.
pub fn rig(config: &SystemConfig) -> (Rig, MockBus, MockPin) {
    let bus = MockBus::new();
    let pin = MockPin::new();
    let hub = SensorHub::new(bus.clone(), config).unwrap();
    let relay = RelayDriver::new(pin.clone(), config.relay_battery_level);
    (HardwareAdapter::new(hub, relay), bus, pin)
}

/// Put the battery at `volts` on the voltage converter.
pub fn set_battery(bus: &MockBus, config: &SystemConfig, volts: f32) {
    bus.set_count(
        config.voltage_adc_address,
        config.battery_channel as u8,
        counts(volts),
    );
}
