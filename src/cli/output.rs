//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::control::{AppliedPower, PowerStrategy};
use crate::cpu::{CpuFamily, SmuAddressTable, SystemIdentity};
use crate::domain::{ModeByte, MonitoringSample, PowerLimits, TemperatureReading};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// CPU identification report
#[derive(Debug, Clone, Serialize)]
pub struct CpuReport {
    pub name: String,
    pub description: String,
    pub family: CpuFamily,
    pub is_amd: bool,
    pub supports_undervolt: bool,
    pub supports_igpu_undervolt: bool,
    pub smu: SmuAddressTable,
}

impl CpuReport {
    pub fn new(identity: &SystemIdentity) -> Self {
        let mut smu = SmuAddressTable::disabled();
        let family = identity.configure_smu_addresses(&mut smu);
        Self {
            name: identity.name.clone(),
            description: identity.description.clone(),
            family,
            is_amd: identity.is_amd(),
            supports_undervolt: identity.supports_undervolt(),
            supports_igpu_undervolt: identity.supports_igpu_undervolt(),
            smu,
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl TableDisplay for CpuReport {
    fn to_table(&self) -> String {
        let mut output = format!(
            "{}\n  {}\n  Family: {}\n  Undervolt: {}\n  iGPU undervolt: {}\n",
            if self.name.is_empty() { "Unknown CPU" } else { &self.name },
            self.description,
            self.family,
            yes_no(self.supports_undervolt),
            yes_no(self.supports_igpu_undervolt),
        );

        if self.smu.enabled {
            output.push_str(&format!(
                "  SMU index/data: 0x{:X}/0x{:X}\n  MP1  msg 0x{:08X} rsp 0x{:08X} arg 0x{:08X}\n  RSMU msg 0x{:08X} rsp 0x{:08X} arg 0x{:08X}",
                self.smu.offset_addr,
                self.smu.offset_data,
                self.smu.mp1.msg,
                self.smu.mp1.rsp,
                self.smu.mp1.arg,
                self.smu.rsmu.msg,
                self.smu.rsmu.rsp,
                self.smu.rsmu.arg,
            ));
        } else {
            output.push_str("  SMU: unsupported");
        }

        output
    }

    fn to_compact(&self) -> String {
        format!("{} [{}]", self.name, self.family)
    }
}

/// A single EC register value
#[derive(Debug, Clone, Serialize)]
pub struct RegisterValue {
    pub address: u16,
    pub value: u8,
}

impl TableDisplay for RegisterValue {
    fn to_table(&self) -> String {
        format!(
            "EC[0x{:02X}] = 0x{:02X} ({})",
            self.address, self.value, self.value
        )
    }
}

/// Power status display
#[derive(Debug, Clone, Serialize)]
pub struct PowerStatus {
    pub strategy: PowerStrategy,
    pub mode_byte: Option<u8>,
    pub limits: Option<PowerLimits>,
}

impl TableDisplay for PowerStatus {
    fn to_table(&self) -> String {
        let mode = match self.mode_byte {
            Some(byte) => match ModeByte::from_byte(byte) {
                Some(mode) => format!("{} (0x{:02X})", mode, byte),
                None => format!("unknown (0x{:02X})", byte),
            },
            None => "unreadable".to_string(),
        };
        let mut output = format!("Strategy: {:?}\n  Mode: {}", self.strategy, mode);
        if let Some(limits) = &self.limits {
            output.push_str(&format!("\n  Limits: {}", limits));
        }
        output
    }
}

/// Result of a power apply
#[derive(Debug, Clone, Serialize)]
pub struct PowerApplied {
    pub mode: String,
    pub applied: AppliedPower,
    pub dry_run: bool,
}

impl TableDisplay for PowerApplied {
    fn to_table(&self) -> String {
        let prefix = if self.dry_run { "[DRY RUN] Would apply" } else { "Applied" };
        format!("✓ {} {}: {}", prefix, self.mode, self.applied)
    }
}

/// Undervolt status display
#[derive(Debug, Clone, Serialize)]
pub struct UndervoltStatus {
    pub supported: bool,
    pub core_mv: i32,
    pub cache_mv: i32,
}

impl TableDisplay for UndervoltStatus {
    fn to_table(&self) -> String {
        let mut output = format!(
            "Core offset: {}mV\n  Cache offset: {}mV",
            self.core_mv, self.cache_mv
        );
        if !self.supported {
            output.push_str("\n  Note: this CPU is not known to accept voltage offsets");
        }
        output
    }
}

/// Thermal status display
#[derive(Debug, Clone, Serialize)]
pub struct ThermalStatus {
    pub tjmax: u8,
    pub tcc_offset: u8,
    pub effective_limit: u8,
}

impl TableDisplay for ThermalStatus {
    fn to_table(&self) -> String {
        format!(
            "TjMax: {}°C\n  TCC Offset: {}°C\n  Effective Limit: {}°C",
            self.tjmax, self.tcc_offset, self.effective_limit
        )
    }
}

impl TableDisplay for MonitoringSample {
    fn to_table(&self) -> String {
        let clock = self
            .average_clock_mhz()
            .map(|c| format!("{} MHz avg over {} cores", c, self.core_clocks_mhz.len()))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "CPU: {:.1}°C  {:.0}% load  {}\n  GPU: {:.1}°C  {:.0}% load  {} MiB VRAM\n  RAM: {}/{} MiB\n  Fan: {} RPM\n  SSD: {:.1}°C  Disk: {:.0}% used",
            self.cpu_temp,
            self.cpu_load,
            clock,
            self.gpu_temp,
            self.gpu_load,
            self.vram_used_mb,
            self.ram_used_mb,
            self.ram_total_mb,
            self.fan_rpm,
            self.ssd_temp,
            self.disk_usage,
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "cpu={:.1}C/{:.0}% gpu={:.1}C/{:.0}% fan={}rpm",
            self.cpu_temp, self.cpu_load, self.gpu_temp, self.gpu_load, self.fan_rpm
        )
    }
}

/// Temperature list display
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureList {
    pub readings: Vec<TemperatureReading>,
}

impl TableDisplay for TemperatureList {
    fn to_table(&self) -> String {
        self.readings
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.readings
            .iter()
            .map(|r| format!("{}={:.1}", r.label, r.celsius))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}
