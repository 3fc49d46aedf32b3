//! OS performance counters and ACPI thermal zones
//!
//! The fallback path of the sensor collector when no rich backend is
//! present: CPU load, clocks, memory and disk come from `sysinfo`,
//! temperatures from `/sys/class/thermal`.

use crate::monitoring::sysfs::{extract_index, list_dirs, read_millidegrees, read_trimmed};
use crate::monitoring::traits::OsCounters;

use std::path::PathBuf;
use sysinfo::{Disks, System};

pub const DEFAULT_THERMAL_ROOT: &str = "/sys/class/thermal";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Zone types that track the CPU package, most specific first
const CPU_ZONE_TYPES: &[&str] = &["x86_pkg_temp", "cpu-thermal", "cpu", "soc", "acpitz"];

/// `sysinfo`-backed counters
pub struct SystemCounters {
    system: System,
    disks: Disks,
    thermal_root: PathBuf,
}

impl SystemCounters {
    pub fn new(thermal_root: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            thermal_root: thermal_root.into(),
        }
    }
}

impl OsCounters for SystemCounters {
    fn is_available(&self) -> bool {
        !self.system.cpus().is_empty()
    }

    fn refresh(&mut self) {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.disks.refresh_list();
    }

    fn cpu_load(&self) -> Option<f32> {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return None;
        }
        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        Some(total / cpus.len() as f32)
    }

    fn core_clocks_mhz(&self) -> Option<Vec<u32>> {
        let clocks: Vec<u32> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.frequency().min(u32::MAX as u64) as u32)
            .collect();
        if clocks.iter().all(|&c| c == 0) {
            return None;
        }
        Some(clocks)
    }

    fn memory_mb(&self) -> Option<(u64, u64)> {
        let total = self.system.total_memory();
        if total == 0 {
            return None;
        }
        Some((self.system.used_memory() / BYTES_PER_MB, total / BYTES_PER_MB))
    }

    fn disk_usage(&self) -> Option<f32> {
        let (total, available) = self
            .disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()));
        if total == 0 {
            return None;
        }
        Some((total - available.min(total)) as f32 / total as f32 * 100.0)
    }

    fn thermal_zones(&self) -> Vec<(String, f32)> {
        read_thermal_zones(&self.thermal_root)
    }
}

/// Every readable `thermal_zoneN` under `root`, ordered by index
pub fn read_thermal_zones(root: &std::path::Path) -> Vec<(String, f32)> {
    let Ok(dirs) = list_dirs(root) else {
        return Vec::new();
    };
    let mut zones: Vec<(usize, String, f32)> = dirs
        .into_iter()
        .filter_map(|dir| {
            let name = dir.file_name()?.to_string_lossy().into_owned();
            let idx = extract_index(&name, "thermal_zone", "")?;
            let kind = read_trimmed(dir.join("type")).unwrap_or_else(|_| name.clone());
            let celsius = read_millidegrees(dir.join("temp"))?;
            Some((idx, kind, celsius))
        })
        .collect();
    zones.sort_by_key(|(idx, _, _)| *idx);
    zones.into_iter().map(|(_, kind, c)| (kind, c)).collect()
}

/// Pick the zone that best represents the CPU package
pub fn cpu_zone_temperature(zones: &[(String, f32)]) -> Option<f32> {
    CPU_ZONE_TYPES
        .iter()
        .find_map(|want| {
            zones
                .iter()
                .find(|(kind, c)| kind.eq_ignore_ascii_case(want) && *c > 0.0)
                .map(|(_, c)| *c)
        })
        .or_else(|| {
            zones
                .iter()
                .map(|(_, c)| *c)
                .filter(|c| *c > 0.0)
                .fold(None, |max: Option<f32>, c| Some(max.map_or(c, |m| m.max(c))))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn zone(root: &std::path::Path, idx: usize, kind: &str, millis: &str) {
        let dir = root.join(format!("thermal_zone{idx}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{kind}\n")).unwrap();
        fs::write(dir.join("temp"), format!("{millis}\n")).unwrap();
    }

    #[test]
    fn test_read_thermal_zones_sorted() {
        let root = TempDir::new().unwrap();
        zone(root.path(), 10, "iwlwifi_1", "39000");
        zone(root.path(), 2, "x86_pkg_temp", "67000");
        fs::create_dir_all(root.path().join("cooling_device0")).unwrap();

        let zones = read_thermal_zones(root.path());
        assert_eq!(
            zones,
            vec![("x86_pkg_temp".to_string(), 67.0), ("iwlwifi_1".to_string(), 39.0)]
        );
    }

    #[test]
    fn test_cpu_zone_prefers_package() {
        let zones = vec![
            ("acpitz".to_string(), 50.0),
            ("x86_pkg_temp".to_string(), 71.0),
        ];
        assert_eq!(cpu_zone_temperature(&zones), Some(71.0));
    }

    #[test]
    fn test_cpu_zone_falls_back_to_hottest() {
        let zones = vec![("pch_cannonlake".to_string(), 48.0), ("INT3400".to_string(), 20.0)];
        assert_eq!(cpu_zone_temperature(&zones), Some(48.0));
        assert_eq!(cpu_zone_temperature(&[]), None);
    }

    #[test]
    fn test_missing_thermal_root() {
        let counters = SystemCounters::new("/nonexistent/thermal");
        assert!(counters.thermal_zones().is_empty());
    }
}
