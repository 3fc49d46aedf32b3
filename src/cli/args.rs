//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::driver::DriverKind;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Gaming-laptop EC/MSR tuning tool
///
/// Read and write allowlisted embedded-controller registers, apply power
/// modes, undervolt, and monitor temperatures.
#[derive(Parser, Debug)]
#[command(name = "ectune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ECTUNE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Driver interface to use
    #[arg(long, global = true, value_enum)]
    pub driver: Option<DriverArg>,

    /// Use synthetic monitoring data instead of real sensors
    #[arg(long, global = true)]
    pub synthetic: bool,

    /// Dry run mode - don't actually apply changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show CPU identity, family and SMU addresses
    Cpu,

    /// Raw embedded controller access
    Ec(EcArgs),

    /// Performance mode and power limits
    Power(PowerArgs),

    /// Core/cache voltage offsets
    Undervolt(UndervoltArgs),

    /// TjMax and TCC offset
    Thermal(ThermalArgs),

    /// Print monitoring samples
    Monitor(MonitorArgs),

    /// Print temperatures from the sensor fallback chain
    Temps {
        /// Wait for slow sensors instead of returning within the latency budget
        #[arg(long)]
        background: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Driver interface argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DriverArg {
    /// Vendor driver ioctls
    Ioctl,
    /// ec_sys debugfs and /dev/cpu/N/msr
    Positional,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Ioctl => DriverKind::Ioctl,
            DriverArg::Positional => DriverKind::Positional,
        }
    }
}

/// Arguments for EC commands
#[derive(Parser, Debug)]
pub struct EcArgs {
    #[command(subcommand)]
    pub command: EcCommands,
}

/// EC subcommands
#[derive(Subcommand, Debug)]
pub enum EcCommands {
    /// Read one register
    Read {
        /// Register address (e.g. 0x2C)
        address: String,
    },

    /// Write one allowlisted register
    Write {
        /// Register address (e.g. 0x37)
        address: String,
        /// Byte value (e.g. 0x80 or 128)
        value: String,
    },
}

/// Arguments for power commands
#[derive(Parser, Debug)]
pub struct PowerArgs {
    #[command(subcommand)]
    pub command: PowerCommands,
}

/// Power subcommands
#[derive(Subcommand, Debug)]
pub enum PowerCommands {
    /// Show current mode and limits
    Status,

    /// Apply a performance mode
    Apply {
        /// Preset name (eco, balanced, performance, turbo) or a custom name
        mode: String,

        /// CPU watt limit override
        #[arg(long)]
        cpu_watts: Option<u32>,

        /// GPU watt limit override
        #[arg(long)]
        gpu_watts: Option<u32>,
    },
}

/// Arguments for undervolt commands
#[derive(Parser, Debug)]
pub struct UndervoltArgs {
    #[command(subcommand)]
    pub command: UndervoltCommands,
}

/// Undervolt subcommands
#[derive(Subcommand, Debug)]
pub enum UndervoltCommands {
    /// Show current offsets
    Status,

    /// Apply voltage offsets in millivolts (-250 to 0)
    Set {
        /// Core plane offset
        #[arg(long, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i32).range(-250..=0))]
        core: Option<i32>,

        /// Cache plane offset
        #[arg(long, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i32).range(-250..=0))]
        cache: Option<i32>,
    },
}

/// Arguments for thermal commands
#[derive(Parser, Debug)]
pub struct ThermalArgs {
    #[command(subcommand)]
    pub command: ThermalCommands,
}

/// Thermal subcommands
#[derive(Subcommand, Debug)]
pub enum ThermalCommands {
    /// Show TjMax, TCC offset and effective limit
    Status,

    /// Set the TCC offset (degrees below TjMax)
    Tcc {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=63))]
        offset: u8,
    },
}

/// Arguments for the monitor command
#[derive(Parser, Debug)]
pub struct MonitorArgs {
    /// Number of samples to print
    #[arg(short = 'n', long, default_value = "1")]
    pub count: u32,

    /// Delay between samples in milliseconds
    #[arg(short, long, default_value = "1000")]
    pub interval_ms: u64,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
