//! Monitoring sample snapshot

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::domain::thermal::{TemperatureReading, CPU_LABEL, GPU_LABEL, SSD_LABEL};

/// Point-in-time hardware snapshot.
///
/// Samples are shared as `Arc<MonitoringSample>` once built and are never
/// mutated afterwards; a refresh always produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSample {
    /// When the sample was collected
    pub timestamp: SystemTime,
    /// CPU package temperature (°C)
    pub cpu_temp: f32,
    /// CPU load (0-100%)
    pub cpu_load: f32,
    /// Per-core clocks in MHz, ordered by core index
    pub core_clocks_mhz: Vec<u32>,
    /// GPU temperature (°C)
    pub gpu_temp: f32,
    /// GPU load (0-100%)
    pub gpu_load: f32,
    /// VRAM in use (MiB)
    pub vram_used_mb: u64,
    /// RAM in use (MiB)
    pub ram_used_mb: u64,
    /// Installed RAM (MiB)
    pub ram_total_mb: u64,
    /// Fan speed (RPM)
    pub fan_rpm: u32,
    /// SSD temperature (°C)
    pub ssd_temp: f32,
    /// Disk usage (0-100%)
    pub disk_usage: f32,
}

impl MonitoringSample {
    /// An all-zero sample stamped now
    pub fn empty() -> Self {
        Self {
            timestamp: SystemTime::now(),
            cpu_temp: 0.0,
            cpu_load: 0.0,
            core_clocks_mhz: Vec::new(),
            gpu_temp: 0.0,
            gpu_load: 0.0,
            vram_used_mb: 0,
            ram_used_mb: 0,
            ram_total_mb: 0,
            fan_rpm: 0,
            ssd_temp: 0.0,
            disk_usage: 0.0,
        }
    }

    /// Average of the per-core clocks, if any were reported
    pub fn average_clock_mhz(&self) -> Option<u32> {
        if self.core_clocks_mhz.is_empty() {
            return None;
        }
        let sum: u64 = self.core_clocks_mhz.iter().map(|&c| c as u64).sum();
        Some((sum / self.core_clocks_mhz.len() as u64) as u32)
    }

    /// Temperature readings carried by this sample, unfiltered
    pub fn temperature_readings(&self) -> Vec<TemperatureReading> {
        vec![
            TemperatureReading::new(CPU_LABEL, self.cpu_temp),
            TemperatureReading::new(GPU_LABEL, self.gpu_temp),
            TemperatureReading::new(SSD_LABEL, self.ssd_temp),
        ]
    }
}

impl Default for MonitoringSample {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample() {
        let sample = MonitoringSample::empty();
        assert_eq!(sample.cpu_temp, 0.0);
        assert!(sample.core_clocks_mhz.is_empty());
        assert_eq!(sample.average_clock_mhz(), None);
    }

    #[test]
    fn test_average_clock() {
        let sample = MonitoringSample {
            core_clocks_mhz: vec![3000, 3200, 4000, 3800],
            ..MonitoringSample::empty()
        };
        assert_eq!(sample.average_clock_mhz(), Some(3500));
    }

    #[test]
    fn test_temperature_readings_labels() {
        let sample = MonitoringSample {
            cpu_temp: 60.0,
            gpu_temp: 55.0,
            ..MonitoringSample::empty()
        };
        let readings = sample.temperature_readings();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0], TemperatureReading::cpu(60.0));
        assert!(!readings[2].is_present());
    }
}
