//! Thermal domain types
//!
//! Labelled temperature readings produced by the sensor fallback chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for CPU package readings
pub const CPU_LABEL: &str = "CPU";
/// Label used for GPU readings
pub const GPU_LABEL: &str = "GPU";
/// Label used for SSD readings
pub const SSD_LABEL: &str = "SSD";

/// A single (label, celsius) reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Sensor label
    pub label: String,
    /// Temperature in degrees Celsius
    pub celsius: f32,
}

impl TemperatureReading {
    /// Create a new reading
    pub fn new(label: impl Into<String>, celsius: f32) -> Self {
        Self {
            label: label.into(),
            celsius,
        }
    }

    /// CPU package reading
    pub fn cpu(celsius: f32) -> Self {
        Self::new(CPU_LABEL, celsius)
    }

    /// GPU reading
    pub fn gpu(celsius: f32) -> Self {
        Self::new(GPU_LABEL, celsius)
    }

    /// Non-positive values mean the sensor is absent
    pub fn is_present(&self) -> bool {
        self.celsius > 0.0 && self.celsius.is_finite()
    }

    /// The zero-valued CPU/GPU pair emitted when nothing else is available
    pub fn neutral_pair() -> Vec<Self> {
        vec![Self::cpu(0.0), Self::gpu(0.0)]
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1}°C", self.label, self.celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_display() {
        assert_eq!(TemperatureReading::cpu(65.0).to_string(), "CPU: 65.0°C");
    }

    #[test]
    fn test_reading_presence() {
        assert!(TemperatureReading::gpu(41.0).is_present());
        assert!(!TemperatureReading::gpu(0.0).is_present());
        assert!(!TemperatureReading::gpu(-5.0).is_present());
        assert!(!TemperatureReading::gpu(f32::NAN).is_present());
    }

    #[test]
    fn test_neutral_pair() {
        let pair = TemperatureReading::neutral_pair();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0].label, CPU_LABEL);
        assert_eq!(pair[1].label, GPU_LABEL);
        assert!(pair.iter().all(|r| r.celsius == 0.0));
    }
}
