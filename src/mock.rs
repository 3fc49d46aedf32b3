//! Mock implementations for testing
//!
//! In-memory transports and sensor backends for unit testing without real
//! hardware. Every transport operation is recorded so tests can assert on
//! exactly what reached the device.

use crate::domain::MonitoringSample;
use crate::driver::{EcTransport, MsrTransport};
use crate::error::MonitorError;
use crate::monitoring::{
    BiosReader, BiosReadings, CancelToken, OsCounters, SampleSource, SensorBackend,
    SensorReadings,
};

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn injected_failure() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "injected transport failure")
}

/// One recorded EC transport operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcOp {
    Read(u16),
    Write(u16, u8),
}

#[derive(Debug, Default)]
struct EcState {
    registers: HashMap<u16, u8>,
    ops: Vec<EcOp>,
    fail: bool,
}

/// Mock embedded controller
///
/// Clones share state, so a test keeps one handle while the channel owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockEc {
    state: Arc<Mutex<EcState>>,
}

impl MockEc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a register
    pub fn set(&self, address: u16, value: u8) {
        self.state.lock().unwrap().registers.insert(address, value);
    }

    /// Current register value (0 if never written)
    pub fn get(&self, address: u16) -> u8 {
        self.state
            .lock()
            .unwrap()
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0)
    }

    /// Every operation issued so far
    pub fn ops(&self) -> Vec<EcOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    /// Writes issued so far, in order
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                EcOp::Write(address, value) => Some((address, value)),
                EcOp::Read(_) => None,
            })
            .collect()
    }

    /// Make every subsequent operation fail
    pub fn fail_io(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }
}

impl EcTransport for MockEc {
    fn read(&mut self, address: u16) -> io::Result<u8> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(EcOp::Read(address));
        if state.fail {
            return Err(injected_failure());
        }
        Ok(state.registers.get(&address).copied().unwrap_or(0))
    }

    fn write(&mut self, address: u16, value: u8) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(EcOp::Write(address, value));
        if state.fail {
            return Err(injected_failure());
        }
        state.registers.insert(address, value);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MsrState {
    registers: HashMap<u32, u64>,
    writes: usize,
    fail: bool,
}

/// Mock MSR device
#[derive(Debug, Clone, Default)]
pub struct MockMsr {
    state: Arc<Mutex<MsrState>>,
}

impl MockMsr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, address: u32, value: u64) {
        self.state.lock().unwrap().registers.insert(address, value);
    }

    pub fn get(&self, address: u32) -> u64 {
        self.state
            .lock()
            .unwrap()
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0)
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn fail_io(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }
}

impl MsrTransport for MockMsr {
    fn read(&mut self, address: u32) -> io::Result<u64> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(injected_failure());
        }
        Ok(state.registers.get(&address).copied().unwrap_or(0))
    }

    fn write(&mut self, address: u32, value: u64) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(injected_failure());
        }
        state.registers.insert(address, value);
        state.writes += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct SensorState {
    readings: SensorReadings,
    available: bool,
    fail: bool,
    delay: Duration,
}

/// Mock rich sensor backend
#[derive(Debug, Clone)]
pub struct MockSensors {
    state: Arc<Mutex<SensorState>>,
    reads: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSensors {
    pub fn new(readings: SensorReadings) -> Self {
        Self {
            state: Arc::new(Mutex::new(SensorState {
                readings,
                available: true,
                fail: false,
                delay: Duration::ZERO,
            })),
            reads: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builder: make each read take `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().delay = delay;
        self
    }

    pub fn set_readings(&self, readings: SensorReadings) {
        self.state.lock().unwrap().readings = readings;
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    pub fn fail_io(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// Number of completed reads
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Highest number of reads that were ever running at once
    pub fn max_concurrent_reads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl SensorBackend for MockSensors {
    fn name(&self) -> &str {
        "mock-sensors"
    }

    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    fn read(&mut self) -> io::Result<SensorReadings> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (readings, fail, delay) = {
            let state = self.state.lock().unwrap();
            (state.readings.clone(), state.fail, state.delay)
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reads.fetch_add(1, Ordering::SeqCst);
        if fail {
            return Err(injected_failure());
        }
        Ok(readings)
    }

    fn restart(&mut self) -> bool {
        self.is_available()
    }
}

/// Mock OS counters with fixed values
#[derive(Debug, Clone)]
pub struct MockCounters {
    available: bool,
    zones: Vec<(String, f32)>,
}

impl MockCounters {
    /// Counters reporting 12.5% load, 4 cores, 4096/16384 MiB RAM, 50% disk
    pub fn new() -> Self {
        Self {
            available: true,
            zones: Vec::new(),
        }
    }

    /// Counters that report nothing at all
    pub fn unavailable() -> Self {
        Self {
            available: false,
            zones: Vec::new(),
        }
    }

    pub fn with_zones(mut self, zones: Vec<(String, f32)>) -> Self {
        self.zones = zones;
        self
    }
}

impl Default for MockCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl OsCounters for MockCounters {
    fn is_available(&self) -> bool {
        self.available
    }

    fn refresh(&mut self) {}

    fn cpu_load(&self) -> Option<f32> {
        self.available.then_some(12.5)
    }

    fn core_clocks_mhz(&self) -> Option<Vec<u32>> {
        self.available.then(|| vec![3200, 3400, 3100, 3300])
    }

    fn memory_mb(&self) -> Option<(u64, u64)> {
        self.available.then_some((4096, 16384))
    }

    fn disk_usage(&self) -> Option<f32> {
        self.available.then_some(50.0)
    }

    fn thermal_zones(&self) -> Vec<(String, f32)> {
        self.zones.clone()
    }
}

/// Mock vendor BIOS reader
#[derive(Debug, Clone)]
pub struct MockBios {
    readings: Arc<Mutex<BiosReadings>>,
    fail: Arc<AtomicBool>,
}

impl MockBios {
    pub fn new(readings: BiosReadings) -> Self {
        Self {
            readings: Arc::new(Mutex::new(readings)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set(&self, readings: BiosReadings) {
        *self.readings.lock().unwrap() = readings;
    }

    pub fn fail_io(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl BiosReader for MockBios {
    fn read(&self) -> io::Result<BiosReadings> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(*self.readings.lock().unwrap())
    }
}

/// Sample source that blocks for a fixed time before answering
#[derive(Debug)]
pub struct StallingSource {
    delay: Duration,
    sample: MonitoringSample,
    calls: AtomicUsize,
}

impl StallingSource {
    pub fn new(delay: Duration, sample: MonitoringSample) -> Self {
        Self {
            delay,
            sample,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of reads started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SampleSource for StallingSource {
    fn name(&self) -> &str {
        "stalling"
    }

    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError> {
        cancel.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Ok(Arc::new(self.sample.clone()))
    }

    fn try_restart(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_ec_records_ops() {
        let mock = MockEc::new();
        let mut transport = mock.clone();
        transport.write(0x37, 0x80).unwrap();
        assert_eq!(transport.read(0x37).unwrap(), 0x80);
        assert_eq!(mock.ops(), vec![EcOp::Write(0x37, 0x80), EcOp::Read(0x37)]);
        assert_eq!(mock.writes(), vec![(0x37, 0x80)]);
    }

    #[test]
    fn test_mock_msr_failure() {
        let mock = MockMsr::new();
        mock.fail_io(true);
        let mut transport = mock.clone();
        assert!(transport.write(0x150, 1).is_err());
        assert_eq!(mock.write_count(), 0);
    }
}
