//! Trait definitions for monitoring backends
//!
//! Sample sources and the sensor backends they are built from. The traits
//! let tests swap every hardware-facing piece for an in-memory fake.

use crate::domain::MonitoringSample;
use crate::error::MonitorError;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and a source
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` if cancellation was requested
    pub fn check(&self) -> Result<(), MonitorError> {
        if self.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }
        Ok(())
    }
}

/// Produces point-in-time monitoring samples
///
/// Cancellation is only observed before hardware I/O starts; an in-flight
/// collection pass runs to completion.
pub trait SampleSource: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Read a complete sample
    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError>;

    /// Attempt to bring the backend back after a failure
    fn try_restart(&self) -> bool;
}

/// Values reported by a rich sensor backend; `None` means the channel is absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReadings {
    pub cpu_temp: Option<f32>,
    pub cpu_load: Option<f32>,
    pub gpu_temp: Option<f32>,
    pub gpu_load: Option<f32>,
    pub vram_used_mb: Option<u64>,
    pub fan_rpm: Option<u32>,
    pub ssd_temp: Option<f32>,
}

/// High-fidelity hardware sensor backend
pub trait SensorBackend: Send {
    fn name(&self) -> &str;

    /// Whether the backend found any hardware to read
    fn is_available(&self) -> bool;

    /// Read every channel the backend knows about
    fn read(&mut self) -> io::Result<SensorReadings>;

    /// Re-discover hardware; returns the new availability
    fn restart(&mut self) -> bool;
}

/// OS-provided performance counters and ACPI thermal zones
pub trait OsCounters: Send {
    /// Whether the OS exposes counters at all
    fn is_available(&self) -> bool;

    /// Update cached counter values
    fn refresh(&mut self);

    fn cpu_load(&self) -> Option<f32>;

    fn core_clocks_mhz(&self) -> Option<Vec<u32>>;

    /// (used, total) in MiB
    fn memory_mb(&self) -> Option<(u64, u64)>;

    fn disk_usage(&self) -> Option<f32>;

    /// ACPI thermal zones as (type, celsius)
    fn thermal_zones(&self) -> Vec<(String, f32)>;
}

/// Values reported by the vendor BIOS/platform interface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiosReadings {
    pub cpu_temp: f32,
    pub gpu_temp: f32,
    pub fan_rpm: u32,
}

/// Raw vendor BIOS sensor interface
pub trait BiosReader: Send + Sync {
    fn read(&self) -> io::Result<BiosReadings>;
}
