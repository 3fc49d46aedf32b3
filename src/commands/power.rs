//! Power command implementation
//!
//! Handles power status and performance-mode commands.

use crate::cli::args::{OutputFormat, PowerArgs, PowerCommands};
use crate::cli::output::{print_output, PowerApplied, PowerStatus};
use crate::commands::open_channel;
use crate::config::Config;
use crate::control::{PowerLimitController, RegisterChannel};
use crate::domain::PerformanceMode;
use crate::error::{DomainError, Result};

use std::sync::Arc;

/// Execute power commands
pub fn run_power(args: &PowerArgs, config: &Config, format: OutputFormat) -> Result<()> {
    match &args.command {
        PowerCommands::Status => run_power_status(config, format),
        PowerCommands::Apply {
            mode,
            cpu_watts,
            gpu_watts,
        } => {
            let mode = resolve_mode(mode, *cpu_watts, *gpu_watts)?;
            run_power_apply(&mode, config, format)
        }
    }
}

fn controller(channel: Arc<RegisterChannel>, config: &Config) -> PowerLimitController {
    PowerLimitController::new(channel, config.ec.strategy()).with_registers(config.ec.registers)
}

/// Preset by name with optional overrides; custom names need both wattages
fn resolve_mode(name: &str, cpu_watts: Option<u32>, gpu_watts: Option<u32>) -> Result<PerformanceMode> {
    let mut mode = match (PerformanceMode::preset(name), cpu_watts, gpu_watts) {
        (Some(preset), _, _) => preset,
        (None, Some(cpu), Some(gpu)) => PerformanceMode::new(name, cpu, gpu),
        (None, _, _) => {
            return Err(DomainError::InvalidValue(format!(
                "'{}' is not a preset; pass both --cpu-watts and --gpu-watts",
                name
            ))
            .into())
        }
    };
    if let Some(cpu) = cpu_watts {
        mode.cpu_watts = cpu;
    }
    if let Some(gpu) = gpu_watts {
        mode.gpu_watts = gpu;
    }
    Ok(mode)
}

fn run_power_status(config: &Config, format: OutputFormat) -> Result<()> {
    let controller = controller(open_channel(config)?, config);
    let status = PowerStatus {
        strategy: controller.strategy(),
        mode_byte: controller.read_current_performance_mode(),
        limits: controller.read_current_power_limits(),
    };
    print_output(&status, format)?;
    Ok(())
}

fn run_power_apply(mode: &PerformanceMode, config: &Config, format: OutputFormat) -> Result<()> {
    let applied = if config.general.dry_run {
        let idle = Arc::new(RegisterChannel::new(config.driver.kind));
        controller(idle, config).plan(mode)
    } else {
        controller(open_channel(config)?, config).apply_performance_limits(mode)?
    };

    print_output(
        &PowerApplied {
            mode: mode.to_string(),
            applied,
            dry_run: config.general.dry_run,
        },
        format,
    )?;
    Ok(())
}
