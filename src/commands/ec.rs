//! EC command implementation
//!
//! Handles raw register read and write commands.

use crate::cli::args::{EcArgs, EcCommands, OutputFormat};
use crate::cli::output::{print_output, Message, RegisterValue};
use crate::commands::open_channel;
use crate::config::Config;
use crate::control::RegisterChannel;
use crate::domain::{parse_byte, parse_ec_address};
use crate::error::{HwError, Result};

/// Execute EC commands
pub fn run_ec(args: &EcArgs, config: &Config, format: OutputFormat) -> Result<()> {
    match &args.command {
        EcCommands::Read { address } => {
            let address = parse_ec_address(address)?;
            let channel = open_channel(config)?;
            let value = channel.read_byte(address)?;
            print_output(&RegisterValue { address, value }, format)?;
        }
        EcCommands::Write { address, value } => {
            let address = parse_ec_address(address)?;
            let value = parse_byte(value)?;
            run_ec_write(address, value, config, format)?;
        }
    }
    Ok(())
}

fn run_ec_write(address: u16, value: u8, config: &Config, format: OutputFormat) -> Result<()> {
    // Reject before touching the device, dry run or not
    if !RegisterChannel::is_writable(address) {
        return Err(HwError::SafetyViolation { address }.into());
    }

    let message = if config.general.dry_run {
        format!("[DRY RUN] Would write 0x{:02X} to EC[0x{:02X}]", value, address)
    } else {
        let channel = open_channel(config)?;
        channel.write_byte(address, value)?;
        format!("Wrote 0x{:02X} to EC[0x{:02X}]", value, address)
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
