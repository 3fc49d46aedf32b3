//! Rich sensor backend over the Linux hwmon class
//!
//! Reads CPU package temperature from the CPU thermal driver, GPU
//! temperature/load/VRAM from the GPU driver, SSD temperature from NVMe,
//! and the fastest fan reported by any chip.

use crate::monitoring::sysfs::{read_u64, HwmonChip};
use crate::monitoring::traits::{SensorBackend, SensorReadings};

use log::debug;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_HWMON_ROOT: &str = "/sys/class/hwmon";

const CPU_CHIPS: &[&str] = &["k10temp", "zenpower", "coretemp", "cpu_thermal"];
const CPU_LABELS: &[&str] = &["Tctl", "Tdie", "Package id 0"];
const GPU_CHIPS: &[&str] = &["amdgpu", "nouveau", "radeon", "nvidia"];
const GPU_LABELS: &[&str] = &["edge", "junction"];
const SSD_CHIPS: &[&str] = &["nvme", "drivetemp"];
const SSD_LABELS: &[&str] = &["Composite"];

/// hwmon-backed `SensorBackend`
pub struct HwmonBackend {
    root: PathBuf,
    chips: Vec<HwmonChip>,
}

impl HwmonBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut backend = Self {
            root: root.into(),
            chips: Vec::new(),
        };
        backend.discover();
        backend
    }

    fn discover(&mut self) {
        self.chips = match HwmonChip::enumerate(&self.root) {
            Ok(chips) => chips
                .into_iter()
                .filter(|c| is_relevant(c))
                .collect(),
            Err(e) => {
                debug!("hwmon root {} unreadable: {e}", self.root.display());
                Vec::new()
            }
        };
        debug!(
            "hwmon chips: {:?}",
            self.chips.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );
    }

    fn chip(&self, names: &[&str]) -> Option<&HwmonChip> {
        self.chips.iter().find(|c| is_known(&c.name, names))
    }
}

fn is_relevant(chip: &HwmonChip) -> bool {
    [CPU_CHIPS, GPU_CHIPS, SSD_CHIPS]
        .iter()
        .any(|names| is_known(&chip.name, names))
        || !chip.fans().is_empty()
}

fn is_known(name: &str, names: &[&str]) -> bool {
    names.iter().any(|n| name.eq_ignore_ascii_case(n))
}

impl SensorBackend for HwmonBackend {
    fn name(&self) -> &str {
        "hwmon"
    }

    fn is_available(&self) -> bool {
        self.chip(CPU_CHIPS).is_some() || self.chip(GPU_CHIPS).is_some()
    }

    fn read(&mut self) -> io::Result<SensorReadings> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} disappeared", self.root.display()),
            ));
        }

        let mut readings = SensorReadings {
            cpu_temp: self.chip(CPU_CHIPS).and_then(|c| c.temperature(CPU_LABELS)),
            ssd_temp: self.chip(SSD_CHIPS).and_then(|c| c.temperature(SSD_LABELS)),
            fan_rpm: self.chips.iter().flat_map(|c| c.fans()).max(),
            ..SensorReadings::default()
        };

        if let Some(gpu) = self.chip(GPU_CHIPS) {
            let device = gpu.dir.join("device");
            readings.gpu_temp = gpu.temperature(GPU_LABELS);
            readings.gpu_load = read_u64(device.join("gpu_busy_percent")).map(|p| p as f32);
            readings.vram_used_mb =
                read_u64(device.join("mem_info_vram_used")).map(|b| b / (1024 * 1024));
        }

        Ok(readings)
    }

    fn restart(&mut self) -> bool {
        self.discover();
        self.is_available()
    }
}
