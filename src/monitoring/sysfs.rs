//! Small helpers for sysfs attribute files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) fn read_trimmed(path: impl AsRef<Path>) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

pub(crate) fn read_u64(path: impl AsRef<Path>) -> Option<u64> {
    read_trimmed(path).ok()?.parse().ok()
}

/// Read a millidegree attribute as °C
pub(crate) fn read_millidegrees(path: impl AsRef<Path>) -> Option<f32> {
    let raw: i64 = read_trimmed(path).ok()?.parse().ok()?;
    Some(raw as f32 / 1000.0)
}

/// Numeric index from names like `temp3_input` or `thermal_zone2`
pub(crate) fn extract_index(name: &str, prefix: &str, suffix: &str) -> Option<usize> {
    name.strip_prefix(prefix)?.strip_suffix(suffix)?.parse().ok()
}

/// Subdirectories of `root`, resolved through symlinks and sorted
pub(crate) fn list_dirs(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .flatten()
        .map(|entry| {
            let path = entry.path();
            fs::canonicalize(&path).unwrap_or(path)
        })
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// One hwmon chip directory
#[derive(Debug, Clone)]
pub(crate) struct HwmonChip {
    pub name: String,
    pub dir: PathBuf,
}

impl HwmonChip {
    /// All chips under a hwmon class root
    pub fn enumerate(root: &Path) -> io::Result<Vec<HwmonChip>> {
        Ok(list_dirs(root)?
            .into_iter()
            .map(|dir| HwmonChip {
                name: read_trimmed(dir.join("name")).unwrap_or_else(|_| "unknown".into()),
                dir,
            })
            .collect())
    }

    /// Labelled temperatures, ordered by sensor index
    ///
    /// Sensors without a `tempN_label` are reported as `tempN`.
    pub fn temperatures(&self) -> Vec<(String, f32)> {
        let mut found: Vec<(usize, String, f32)> = Vec::new();
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(idx) = extract_index(&file_name, "temp", "_input") else {
                continue;
            };
            let Some(celsius) = read_millidegrees(entry.path()) else {
                continue;
            };
            let label = read_trimmed(self.dir.join(format!("temp{idx}_label")))
                .unwrap_or_else(|_| format!("temp{idx}"));
            found.push((idx, label, celsius));
        }
        found.sort_by_key(|(idx, _, _)| *idx);
        found.into_iter().map(|(_, label, c)| (label, c)).collect()
    }

    /// Preferred temperature: first label match, otherwise the lowest index
    pub fn temperature(&self, preferred_labels: &[&str]) -> Option<f32> {
        let temps = self.temperatures();
        preferred_labels
            .iter()
            .find_map(|want| {
                temps
                    .iter()
                    .find(|(label, _)| label.eq_ignore_ascii_case(want))
                    .map(|(_, c)| *c)
            })
            .or_else(|| temps.first().map(|(_, c)| *c))
    }

    /// Fan speeds in RPM, ordered by fan index
    pub fn fans(&self) -> Vec<u32> {
        let mut found: Vec<(usize, u32)> = Vec::new();
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(idx) = extract_index(&file_name, "fan", "_input") {
                if let Some(rpm) = read_u64(entry.path()) {
                    found.push((idx, rpm.min(u32::MAX as u64) as u32));
                }
            }
        }
        found.sort_by_key(|(idx, _)| *idx);
        found.into_iter().map(|(_, rpm)| rpm).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_index() {
        assert_eq!(extract_index("temp3_input", "temp", "_input"), Some(3));
        assert_eq!(extract_index("temp_input", "temp", "_input"), None);
        assert_eq!(extract_index("fan1_input", "temp", "_input"), None);
        assert_eq!(extract_index("thermal_zone12", "thermal_zone", ""), Some(12));
    }

    #[test]
    fn test_chip_temperatures_and_labels() {
        let root = TempDir::new().unwrap();
        let chip = root.path().join("hwmon0");
        fs::create_dir(&chip).unwrap();
        fs::write(chip.join("name"), "k10temp\n").unwrap();
        fs::write(chip.join("temp1_input"), "61250\n").unwrap();
        fs::write(chip.join("temp1_label"), "Tctl\n").unwrap();
        fs::write(chip.join("temp3_input"), "58000\n").unwrap();
        fs::write(chip.join("fan2_input"), "2400\n").unwrap();

        let chips = HwmonChip::enumerate(root.path()).unwrap();
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].name, "k10temp");

        let temps = chips[0].temperatures();
        assert_eq!(temps[0], ("Tctl".to_string(), 61.25));
        assert_eq!(temps[1], ("temp3".to_string(), 58.0));
        assert_eq!(chips[0].temperature(&["temp3"]), Some(58.0));
        assert_eq!(chips[0].temperature(&["Tdie"]), Some(61.25));
        assert_eq!(chips[0].fans(), vec![2400]);
    }

    #[test]
    fn test_missing_root() {
        assert!(HwmonChip::enumerate(Path::new("/nonexistent/hwmon")).is_err());
    }
}
