//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::control::{MsrAddressMap, PowerRegisterMap, PowerStrategy, MIN_SETTLE};
use crate::driver::DriverKind;
use crate::error::ConfigError;
use crate::monitoring::bios::DEFAULT_PLATFORM_CHIPS;
use crate::monitoring::collector::DEFAULT_CACHE_WINDOW;
use crate::monitoring::counters::DEFAULT_THERMAL_ROOT;
use crate::monitoring::fallback::WaitBudget;
use crate::monitoring::hwmon::DEFAULT_HWMON_ROOT;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Privileged driver selection
    pub driver: DriverConfig,
    /// Embedded controller settings
    pub ec: EcConfig,
    /// Model-specific register addresses
    pub msr: MsrAddressMap,
    /// Monitoring settings
    pub monitor: MonitorConfig,
}

impl Config {
    /// Reject values that cannot be used as-is
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ec.settle_ms > 1000 {
            return Err(ConfigError::InvalidValue {
                key: "ec.settle_ms".into(),
                message: format!("{} exceeds 1000", self.ec.settle_ms),
            });
        }
        if self.monitor.latency_budget_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.latency_budget_ms".into(),
                message: format!("{} exceeds 60000", self.monitor.latency_budget_ms),
            });
        }
        Ok(())
    }
}

/// General configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Print planned writes without touching hardware
    pub dry_run: bool,
}

/// Driver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// `ioctl` or `positional`
    pub kind: DriverKind,
    /// EC device override
    pub ec_device: Option<PathBuf>,
    /// MSR device override
    pub msr_device: Option<PathBuf>,
}

impl DriverConfig {
    pub const IOCTL_DEVICE: &'static str = "/dev/ectune";
    pub const EC_SYS_IO: &'static str = "/sys/kernel/debug/ec/ec0/io";
    pub const CPU_MSR: &'static str = "/dev/cpu/0/msr";

    /// Device path for the EC channel
    pub fn ec_path(&self) -> PathBuf {
        self.ec_device.clone().unwrap_or_else(|| match self.kind {
            DriverKind::Ioctl => PathBuf::from(Self::IOCTL_DEVICE),
            DriverKind::Positional => PathBuf::from(Self::EC_SYS_IO),
        })
    }

    /// Device path for MSR access
    pub fn msr_path(&self) -> PathBuf {
        self.msr_device.clone().unwrap_or_else(|| match self.kind {
            DriverKind::Ioctl => PathBuf::from(Self::IOCTL_DEVICE),
            DriverKind::Positional => PathBuf::from(Self::CPU_MSR),
        })
    }
}

/// Embedded controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcConfig {
    /// Delay after each write in milliseconds
    pub settle_ms: u64,
    /// Write only the performance-mode byte instead of raw limits
    pub simplified_mode: bool,
    /// Per-model register map (unverified data)
    pub registers: PowerRegisterMap,
}

impl Default for EcConfig {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            simplified_mode: true,
            registers: PowerRegisterMap::default(),
        }
    }
}

impl EcConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms).max(MIN_SETTLE)
    }

    pub fn strategy(&self) -> PowerStrategy {
        if self.simplified_mode {
            PowerStrategy::Simplified
        } else {
            PowerStrategy::Detailed
        }
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sample cache freshness window
    pub cache_window_ms: u64,
    /// Bounded wait for latency-sensitive temperature reads
    pub latency_budget_ms: u64,
    /// hwmon class root
    pub hwmon_root: PathBuf,
    /// thermal class root
    pub thermal_root: PathBuf,
    /// hwmon chip names of vendor platform drivers
    pub bios_chips: Vec<String>,
    /// Use the synthetic generator instead of real sensors
    pub synthetic: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cache_window_ms: DEFAULT_CACHE_WINDOW.as_millis() as u64,
            latency_budget_ms: WaitBudget::LATENCY_SENSITIVE.as_millis() as u64,
            hwmon_root: PathBuf::from(DEFAULT_HWMON_ROOT),
            thermal_root: PathBuf::from(DEFAULT_THERMAL_ROOT),
            bios_chips: DEFAULT_PLATFORM_CHIPS.iter().map(|s| s.to_string()).collect(),
            synthetic: false,
        }
    }
}

impl MonitorConfig {
    pub fn cache_window(&self) -> Duration {
        match self.cache_window_ms {
            0 => DEFAULT_CACHE_WINDOW,
            ms => Duration::from_millis(ms),
        }
    }

    /// Budget for interactive callers
    pub fn latency_budget(&self) -> WaitBudget {
        match self.latency_budget_ms {
            0 => WaitBudget::latency_sensitive(),
            ms => WaitBudget::Bounded(Duration::from_millis(ms)),
        }
    }
}
