//! Thermal command implementation
//!
//! Handles TjMax status and TCC offset commands.

use crate::cli::args::{OutputFormat, ThermalArgs, ThermalCommands};
use crate::cli::output::{print_output, Message, ThermalStatus};
use crate::commands::open_msr;
use crate::config::Config;
use crate::domain::TccOffset;
use crate::error::Result;

/// Execute thermal commands
pub fn run_thermal(args: &ThermalArgs, config: &Config, format: OutputFormat) -> Result<()> {
    match &args.command {
        ThermalCommands::Status => {
            let access = open_msr(config)?;
            let status = ThermalStatus {
                tjmax: access.read_tjmax(),
                tcc_offset: access.read_tcc_offset(),
                effective_limit: access.effective_temp_limit(),
            };
            print_output(&status, format)?;
        }
        ThermalCommands::Tcc { offset } => {
            let offset = TccOffset::new(i32::from(*offset))?;
            let message = if config.general.dry_run {
                format!("[DRY RUN] Would set TCC offset to {}°C", offset.as_degrees())
            } else {
                let access = open_msr(config)?;
                access.set_tcc_offset(i32::from(offset.as_degrees()))?;
                format!(
                    "Set TCC offset to {}°C (limit {}°C)",
                    offset.as_degrees(),
                    access.effective_temp_limit()
                )
            };
            print_output(
                &Message {
                    message,
                    success: true,
                },
                format,
            )?;
        }
    }
    Ok(())
}
