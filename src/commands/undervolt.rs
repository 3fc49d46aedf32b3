//! Undervolt command implementation

use crate::cli::args::{OutputFormat, UndervoltArgs, UndervoltCommands};
use crate::cli::output::{print_output, Message, UndervoltStatus};
use crate::commands::open_msr;
use crate::config::Config;
use crate::cpu::SystemIdentity;
use crate::domain::VoltageOffset;
use crate::error::{DomainError, Result};

/// Execute undervolt commands
pub fn run_undervolt(args: &UndervoltArgs, config: &Config, format: OutputFormat) -> Result<()> {
    match &args.command {
        UndervoltCommands::Status => {
            let access = open_msr(config)?;
            let status = UndervoltStatus {
                supported: SystemIdentity::current().supports_undervolt(),
                core_mv: access.read_core_voltage_offset(),
                cache_mv: access.read_cache_voltage_offset(),
            };
            print_output(&status, format)?;
        }
        UndervoltCommands::Set { core, cache } => {
            run_undervolt_set(*core, *cache, config, format)?;
        }
    }
    Ok(())
}

fn run_undervolt_set(
    core: Option<i32>,
    cache: Option<i32>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    if core.is_none() && cache.is_none() {
        return Err(DomainError::InvalidValue("pass --core and/or --cache".into()).into());
    }
    let core = core.map(VoltageOffset::new).transpose()?;
    let cache = cache.map(VoltageOffset::new).transpose()?;

    if !SystemIdentity::current().supports_undervolt() {
        log::warn!("CPU is not on the undervolt list; the write may be ignored");
    }

    let describe = |plane: &str, offset: Option<VoltageOffset>| {
        offset.map(|o| format!("{} {}mV", plane, o.as_millivolts()))
    };
    let summary = [describe("core", core), describe("cache", cache)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

    let message = if config.general.dry_run {
        format!("[DRY RUN] Would apply {}", summary)
    } else {
        let access = open_msr(config)?;
        if let Some(offset) = core {
            access.apply_core_voltage_offset(offset.as_millivolts())?;
        }
        if let Some(offset) = cache {
            access.apply_cache_voltage_offset(offset.as_millivolts())?;
        }
        format!("Applied {}", summary)
    };

    print_output(
        &Message {
            message,
            success: true,
        },
        format,
    )?;
    Ok(())
}
