//! Vendor platform (BIOS/EC firmware) sensors
//!
//! Laptop platform drivers such as `acer-wmi`, `asus-wmi`, `dell-smm` or
//! `thinkpad_acpi` publish the firmware's own CPU/GPU temperatures and fan
//! speed through a hwmon chip. They are coarse but need no other driver.

use crate::domain::{MonitoringSample, TemperatureReading};
use crate::error::MonitorError;
use crate::monitoring::sysfs::HwmonChip;
use crate::monitoring::traits::{BiosReader, BiosReadings, CancelToken, SampleSource};

use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// hwmon chip names published by vendor platform drivers
pub const DEFAULT_PLATFORM_CHIPS: &[&str] = &[
    "acer",
    "asus",
    "asus_wmi_sensors",
    "dell_smm",
    "thinkpad",
    "hp",
    "msi_ec",
];

/// Vendor platform hwmon chip
#[derive(Debug, Clone)]
pub struct PlatformBios {
    dir: PathBuf,
    name: String,
}

impl PlatformBios {
    /// Find the first platform chip under `root` whose name is listed in `chips`
    pub fn discover(root: &Path, chips: &[String]) -> Option<Self> {
        let found = HwmonChip::enumerate(root)
            .ok()?
            .into_iter()
            .find(|chip| chips.iter().any(|want| chip.name.eq_ignore_ascii_case(want)))?;
        debug!("platform sensors: {} at {}", found.name, found.dir.display());
        Some(Self {
            dir: found.dir,
            name: found.name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BiosReader for PlatformBios {
    fn read(&self) -> io::Result<BiosReadings> {
        let chip = HwmonChip {
            name: self.name.clone(),
            dir: self.dir.clone(),
        };
        let temps = chip.temperatures();
        if temps.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} reports no temperatures", self.name),
            ));
        }

        let labelled = |needle: &str| {
            temps
                .iter()
                .find(|(label, _)| label.to_ascii_uppercase().contains(needle))
                .map(|(_, c)| *c)
        };
        let cpu = labelled("CPU").unwrap_or(temps[0].1);
        let gpu = labelled("GPU")
            .or_else(|| temps.get(1).map(|(_, c)| *c))
            .unwrap_or(0.0);

        Ok(BiosReadings {
            cpu_temp: cpu,
            gpu_temp: gpu,
            fan_rpm: chip.fans().into_iter().max().unwrap_or(0),
        })
    }
}

/// CPU/GPU readings from a BIOS reader, absent channels filtered out
pub fn bios_temperatures(reader: &dyn BiosReader) -> io::Result<Vec<TemperatureReading>> {
    let r = reader.read()?;
    Ok([TemperatureReading::cpu(r.cpu_temp), TemperatureReading::gpu(r.gpu_temp)]
        .into_iter()
        .filter(TemperatureReading::is_present)
        .collect())
}

/// Sample source that only knows what the firmware reports
///
/// Used only when no richer source is present.
pub struct BiosOnlySource {
    reader: Arc<dyn BiosReader>,
}

impl BiosOnlySource {
    pub fn new(reader: Arc<dyn BiosReader>) -> Self {
        Self { reader }
    }
}

impl SampleSource for BiosOnlySource {
    fn name(&self) -> &str {
        "bios"
    }

    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError> {
        cancel.check()?;
        let mut sample = MonitoringSample::empty();
        match self.reader.read() {
            Ok(r) => {
                sample.cpu_temp = r.cpu_temp;
                sample.gpu_temp = r.gpu_temp;
                sample.fan_rpm = r.fan_rpm;
            }
            Err(e) => debug!("BIOS read failed: {e}"),
        }
        Ok(Arc::new(sample))
    }

    fn try_restart(&self) -> bool {
        self.reader.read().is_ok()
    }
}

/// Wraps another source and fills missing CPU/GPU temperatures and fan
/// speed from the firmware
pub struct BiosEnhancedSource {
    inner: Arc<dyn SampleSource>,
    reader: Arc<dyn BiosReader>,
}

impl BiosEnhancedSource {
    pub fn new(inner: Arc<dyn SampleSource>, reader: Arc<dyn BiosReader>) -> Self {
        Self { inner, reader }
    }
}

impl SampleSource for BiosEnhancedSource {
    fn name(&self) -> &str {
        "bios-enhanced"
    }

    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError> {
        let sample = self.inner.read_sample(cancel)?;
        let needs_bios = sample.cpu_temp <= 0.0 || sample.gpu_temp <= 0.0 || sample.fan_rpm == 0;
        if !needs_bios {
            return Ok(sample);
        }
        let Ok(bios) = self.reader.read() else {
            return Ok(sample);
        };

        let mut merged = MonitoringSample {
            timestamp: SystemTime::now(),
            ..(*sample).clone()
        };
        if merged.cpu_temp <= 0.0 {
            merged.cpu_temp = bios.cpu_temp;
        }
        if merged.gpu_temp <= 0.0 {
            merged.gpu_temp = bios.gpu_temp;
        }
        if merged.fan_rpm == 0 {
            merged.fan_rpm = bios.fan_rpm;
        }
        Ok(Arc::new(merged))
    }

    fn try_restart(&self) -> bool {
        self.inner.try_restart()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBios;
    use crate::monitoring::synthetic::SyntheticSource;
    use std::fs;
    use tempfile::TempDir;

    fn platform_chip(root: &Path) {
        let dir = root.join("hwmon4");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), "acer\n").unwrap();
        fs::write(dir.join("temp1_input"), "48000\n").unwrap();
        fs::write(dir.join("temp2_input"), "61000\n").unwrap();
        fs::write(dir.join("temp2_label"), "GPU\n").unwrap();
        fs::write(dir.join("fan1_input"), "2900\n").unwrap();
    }

    #[test]
    fn test_discover_and_read_platform_chip() {
        let root = TempDir::new().unwrap();
        platform_chip(root.path());

        let chips: Vec<String> = DEFAULT_PLATFORM_CHIPS.iter().map(|s| s.to_string()).collect();
        let bios = PlatformBios::discover(root.path(), &chips).unwrap();
        assert_eq!(bios.name(), "acer");

        let r = bios.read().unwrap();
        assert_eq!(r.cpu_temp, 48.0);
        assert_eq!(r.gpu_temp, 61.0);
        assert_eq!(r.fan_rpm, 2900);
    }

    #[test]
    fn test_discover_ignores_unlisted_chips() {
        let root = TempDir::new().unwrap();
        platform_chip(root.path());
        assert!(PlatformBios::discover(root.path(), &["dell_smm".to_string()]).is_none());
    }

    #[test]
    fn test_bios_only_source() {
        let bios = MockBios::new(BiosReadings {
            cpu_temp: 52.0,
            gpu_temp: 0.0,
            fan_rpm: 1800,
        });
        let source = BiosOnlySource::new(Arc::new(bios));

        let s = source.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 52.0);
        assert_eq!(s.fan_rpm, 1800);
        assert_eq!(s.cpu_load, 0.0);
        assert!(source.try_restart());
    }

    #[test]
    fn test_bios_only_degrades_on_failure() {
        let bios = MockBios::new(BiosReadings::default());
        bios.fail_io(true);
        let source = BiosOnlySource::new(Arc::new(bios));

        let s = source.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 0.0);
        assert!(!source.try_restart());
    }

    #[test]
    fn test_bios_temperatures_filters_zero() {
        let bios = MockBios::new(BiosReadings {
            cpu_temp: 49.0,
            gpu_temp: 0.0,
            fan_rpm: 0,
        });
        let temps = bios_temperatures(&bios).unwrap();
        assert_eq!(temps, vec![TemperatureReading::cpu(49.0)]);
    }

    #[test]
    fn test_enhanced_source_keeps_complete_samples() {
        let inner: Arc<dyn SampleSource> = Arc::new(SyntheticSource::with_seed(3, 2));
        let bios = MockBios::new(BiosReadings {
            cpu_temp: 1.0,
            gpu_temp: 1.0,
            fan_rpm: 1,
        });
        let source = BiosEnhancedSource::new(inner, Arc::new(bios));

        let s = source.read_sample(&CancelToken::new()).unwrap();
        assert!(s.cpu_temp >= 35.0);
        assert!(s.fan_rpm >= 1200);
    }

    #[test]
    fn test_enhanced_source_fills_gaps() {
        let inner: Arc<dyn SampleSource> = Arc::new(BiosOnlySource::new(Arc::new(MockBios::new(
            BiosReadings {
                cpu_temp: 70.0,
                gpu_temp: 0.0,
                fan_rpm: 0,
            },
        ))));
        let bios = MockBios::new(BiosReadings {
            cpu_temp: 50.0,
            gpu_temp: 62.0,
            fan_rpm: 2500,
        });
        let source = BiosEnhancedSource::new(inner, Arc::new(bios));

        let s = source.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 70.0);
        assert_eq!(s.gpu_temp, 62.0);
        assert_eq!(s.fan_rpm, 2500);
    }
}
